use std::collections::BTreeSet;

use approx::assert_abs_diff_eq;
use pathtrace_core::{CoordinateFrame, MotionAssembler, MotionPath, Trace, TraceError, Vec3};
use serde_json::json;
use uuid::Uuid;

fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

#[test]
fn three_waypoint_interpolation() {
    let path = MotionPath::new(
        0.0,
        vec![
            (0.0, Vec3::new(0.0, 0.0, 0.0)),
            (10.0, Vec3::new(10.0, 0.0, 0.0)),
            (20.0, Vec3::new(10.0, 10.0, 0.0)),
        ],
    );

    assert_eq!(path.interpolate(5.0).unwrap(), Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(path.interpolate(15.0).unwrap(), Vec3::new(10.0, 5.0, 0.0));
    assert_eq!(path.interpolate(-3.0).unwrap(), Vec3::new(0.0, 0.0, 0.0));
    assert_eq!(path.interpolate(99.0).unwrap(), Vec3::new(10.0, 10.0, 0.0));
}

#[test]
fn empty_path_reports_instead_of_panicking() {
    let path = MotionPath::default();
    assert!(matches!(path.interpolate(1.0), Err(TraceError::EmptyPath)));
    assert!(matches!(path.bounds(), Err(TraceError::EmptyPath)));
}

#[test]
fn unresolved_parents_are_counted_not_fatal() {
    let mut trace = Trace::from_records(
        vec![
            json!({ "event": "add", "time": "0ms", "id": id(1).to_string(), "local": 1 }),
            json!({ "event": "add", "time": "5ms", "id": id(2).to_string(), "parent_local": 1 }),
            json!({ "event": "add", "time": "6ms", "id": id(3).to_string(), "parent_local": 42 }),
        ],
        None,
    )
    .unwrap();

    let first = trace.fill_parents();
    let second = trace.fill_parents();
    assert_eq!(first, second);
    assert_eq!(first.resolved, 1);
    assert_eq!(first.unresolved, 1);

    let summary = trace.summary();
    assert_eq!(summary.objects, 3);
    assert_eq!(summary.roots, 1);
    assert_eq!(summary.unresolved_parents, Some(1));
}

#[test]
fn attachment_follows_avatar_in_absolute_frame() {
    let avatar = id(10);
    let hat = id(11);

    let mut trace = Trace::from_records(
        vec![
            json!({ "event": "add", "time": "0ms", "id": avatar.to_string(),
                    "local": 7, "type": "avatar" }),
            json!({ "event": "update", "time": "0ms", "id": avatar.to_string(),
                    "pos": { "x": 10, "y": 10, "z": 0 } }),
            json!({ "event": "update", "time": "1000ms", "id": avatar.to_string(),
                    "pos": { "x": 20, "y": 10, "z": 0 } }),
            json!({ "event": "add", "time": "100ms", "id": hat.to_string(),
                    "parent_local": 7, "type": "attachment" }),
            json!({ "event": "update", "time": "250ms", "id": hat.to_string(),
                    "pos": { "x": 0, "y": 0, "z": 2 } }),
        ],
        None,
    )
    .unwrap();
    trace.fill_parents();
    let roots = trace.roots(false);
    assert_eq!(roots, BTreeSet::from([avatar]));
    assert_eq!(trace.avatars(), &BTreeSet::from([avatar]));

    let local = MotionAssembler::new(CoordinateFrame::Local).build(&trace, &roots);
    assert_eq!(local[&hat][0].points()[0], Vec3::new(0.0, 0.0, 2.0));

    let absolute = MotionAssembler::new(CoordinateFrame::Absolute).build(&trace, &roots);
    let hat_position = absolute[&hat][0].points()[0];
    assert_abs_diff_eq!(hat_position.x, 12.5, epsilon = 1e-9);
    assert_abs_diff_eq!(hat_position.y, 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(hat_position.z, 2.0, epsilon = 1e-9);
}

#[test]
fn ambiguous_roots_are_opt_in() {
    let trace = Trace::from_records(
        vec![
            json!({ "event": "add", "time": "0ms", "id": id(1).to_string() }),
            json!({ "event": "add", "time": "0ms", "id": id(2).to_string() }),
            json!({ "event": "add", "time": "9ms", "id": id(2).to_string(), "parent_local": 4 }),
            json!({ "event": "add", "time": "9ms", "id": id(3).to_string(), "parent": id(1).to_string() }),
        ],
        None,
    )
    .unwrap();

    assert_eq!(trace.roots(false), BTreeSet::from([id(1), id(3)]));
    assert_eq!(trace.roots(true), BTreeSet::from([id(1), id(2), id(3)]));
}
