//! Building motion paths out of a trace.
//!
//! Every object named by an update or addition event that carries a position
//! gets one path per *segment*: the stretch between the object entering the
//! interest set and the next `kill` event for it. Children are walked from
//! the requested roots through the resolved parent map.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::CoordinateFrame,
    event::{Event, EventKind},
    motion_path::MotionPath,
    progress::{NoProgress, ProgressSink},
    trace::Trace,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MotionAssembler {
    frame: CoordinateFrame,
}

impl MotionAssembler {
    pub fn new(frame: CoordinateFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> CoordinateFrame {
        self.frame
    }

    /// Paths for each root in `roots` and all of its descendants.
    ///
    /// The trace's parents should already be filled.
    pub fn build(&self, trace: &Trace, roots: &BTreeSet<Uuid>) -> HashMap<Uuid, Vec<MotionPath>> {
        self.build_with_progress(trace, roots, &mut NoProgress)
    }

    pub fn build_with_progress(
        &self,
        trace: &Trace,
        roots: &BTreeSet<Uuid>,
        progress: &mut dyn ProgressSink,
    ) -> HashMap<Uuid, Vec<MotionPath>> {
        if !trace.parents_filled() {
            warn!("assembling motion paths before parent resolution");
        }

        let epoch = trace.start_time().unwrap_or(0.0);
        let by_object = events_by_object(trace);
        let children = trace.children();

        let mut out: HashMap<Uuid, Vec<MotionPath>> = HashMap::new();
        let mut visited = HashSet::new();
        let total = roots.len();

        for (done, &root) in roots.iter().enumerate() {
            let mut stack: Vec<(Uuid, Option<Uuid>)> = vec![(root, None)];

            while let Some((id, parent)) = stack.pop() {
                if !visited.insert(id) {
                    continue;
                }

                let local = by_object
                    .get(&id)
                    .map(|events| segments(epoch, events))
                    .unwrap_or_default();

                let paths = match (self.frame, parent.and_then(|p| out.get(&p))) {
                    (CoordinateFrame::Absolute, Some(parent_paths)) => {
                        to_absolute(local, parent_paths)
                    }
                    _ => local,
                };
                out.insert(id, paths);

                if let Some(kids) = children.get(&id) {
                    stack.extend(kids.iter().rev().map(|&kid| (kid, Some(id))));
                }
            }

            progress.progress(done + 1, total);
        }

        debug!(
            objects = out.len(),
            frame = self.frame.name(),
            "assembled motion paths"
        );
        out
    }

    /// Run [`MotionAssembler::build`] once per cluster and concatenate the
    /// segments of objects that appear in more than one cluster.
    pub fn build_clustered(
        &self,
        clusters: &[Trace],
        roots: &BTreeSet<Uuid>,
        progress: &mut dyn ProgressSink,
    ) -> HashMap<Uuid, Vec<MotionPath>> {
        let total = roots.len();
        let mut done = 0;
        let mut out: HashMap<Uuid, Vec<MotionPath>> = HashMap::new();

        for cluster in clusters {
            let cluster_roots: BTreeSet<Uuid> = roots
                .iter()
                .filter(|id| cluster.objects().contains(id))
                .copied()
                .collect();

            let mut forward = |current: usize, _total: usize| {
                progress.progress(done + current, total);
            };
            let built = self.build_with_progress(cluster, &cluster_roots, &mut forward);
            done += cluster_roots.len();

            for (id, paths) in built {
                out.entry(id).or_default().extend(paths);
            }
        }

        progress.finish();
        out
    }
}

fn events_by_object(trace: &Trace) -> HashMap<Uuid, Vec<&Event>> {
    let mut by_object: HashMap<Uuid, Vec<&Event>> = HashMap::new();
    for event in trace {
        if let Some(id) = event.object_id {
            by_object.entry(id).or_default().push(event);
        }
    }
    by_object
}

/// Split one object's events into segments at each removal.
fn segments(epoch: f64, events: &[&Event]) -> Vec<MotionPath> {
    let mut out = Vec::new();
    let mut current = MotionPath::new(epoch, Vec::new());

    for event in events {
        match (&event.kind, event.position) {
            (EventKind::Added | EventKind::Updated, Some(position)) => {
                current.push(event.time, position);
            }
            (EventKind::Removed, _) if !current.is_empty() => {
                out.push(std::mem::replace(
                    &mut current,
                    MotionPath::new(epoch, Vec::new()),
                ));
            }
            _ => {}
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Offset each child segment by the parent segment that covers its start.
fn to_absolute(local: Vec<MotionPath>, parent_paths: &[MotionPath]) -> Vec<MotionPath> {
    local
        .into_iter()
        .map(|segment| {
            let Ok(start) = segment.start_time() else {
                return segment;
            };
            match covering_segment(parent_paths, start) {
                Some(parent) => segment.translated_by(parent).unwrap_or(segment),
                None => segment,
            }
        })
        .collect()
}

/// The parent segment whose time range contains `t`, else the last one that
/// started before `t`, else the first one.
fn covering_segment(paths: &[MotionPath], t: f64) -> Option<&MotionPath> {
    let started_before = |p: &&MotionPath| p.start_time().is_ok_and(|s| s <= t);

    paths
        .iter()
        .filter(started_before)
        .find(|p| p.end_time().is_ok_and(|e| t <= e))
        .or_else(|| paths.iter().filter(started_before).last())
        .or_else(|| paths.first())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::vec3::Vec3;

    fn added(time: f64, id: Uuid) -> Event {
        Event::new(EventKind::Added, time).with_object(id)
    }

    fn update(time: f64, id: Uuid, x: f64, y: f64) -> Event {
        Event::new(EventKind::Updated, time)
            .with_object(id)
            .with_position(Vec3::new(x, y, 0.0))
    }

    fn kill(time: f64, id: Uuid) -> Event {
        Event::new(EventKind::Removed, time).with_object(id)
    }

    #[test]
    fn waypoints_follow_arrival_order() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        let mut trace = Trace::from_events(
            vec![
                added(0.0, a),
                added(0.0, b),
                update(0.1, a, 1.0, 0.0),
                update(0.2, b, 9.0, 9.0),
                update(0.3, a, 2.0, 0.0),
                update(0.4, a, 3.0, 0.0),
            ],
            None,
        );
        trace.fill_parents();
        let roots = trace.roots(false);

        let paths = MotionAssembler::default().build(&trace, &roots);

        assert_eq!(paths.len(), 2);
        let a_paths = &paths[&a];
        assert_eq!(a_paths.len(), 1);
        assert_eq!(a_paths[0].timestamps(), &[0.1, 0.3, 0.4]);
        assert_eq!(paths[&b][0].len(), 1);
    }

    #[test]
    fn removal_starts_a_new_segment() {
        let a = Uuid::from_u128(1);

        let mut trace = Trace::from_events(
            vec![
                added(0.0, a),
                update(0.1, a, 1.0, 0.0),
                update(0.2, a, 2.0, 0.0),
                kill(0.3, a),
                added(0.5, a),
                update(0.6, a, 5.0, 0.0),
            ],
            None,
        );
        trace.fill_parents();

        let paths = MotionAssembler::default().build(&trace, &BTreeSet::from([a]));
        let segments = &paths[&a];

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1].timestamps(), &[0.6]);
    }

    #[test]
    fn children_are_included_in_local_frame() {
        let root = Uuid::from_u128(1);
        let child = Uuid::from_u128(2);

        let mut trace = Trace::from_events(
            vec![
                added(0.0, root).with_local(5),
                added(0.0, child).with_parent_local(5),
                update(0.0, root, 100.0, 0.0),
                update(1.0, root, 110.0, 0.0),
                update(0.5, child, 0.0, 1.0),
            ],
            None,
        );
        trace.fill_parents();
        let roots = trace.roots(false);
        assert_eq!(roots, BTreeSet::from([root]));

        let paths = MotionAssembler::new(CoordinateFrame::Local).build(&trace, &roots);
        assert_eq!(paths[&child][0].points()[0], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn absolute_frame_offsets_children_by_parent() {
        let root = Uuid::from_u128(1);
        let child = Uuid::from_u128(2);

        let mut trace = Trace::from_events(
            vec![
                added(0.0, root).with_local(5),
                added(0.0, child).with_parent_local(5),
                update(0.0, root, 100.0, 0.0),
                update(1.0, root, 110.0, 0.0),
                update(0.5, child, 0.0, 1.0),
            ],
            None,
        );
        trace.fill_parents();
        let roots = trace.roots(false);

        let paths = MotionAssembler::new(CoordinateFrame::Absolute).build(&trace, &roots);
        let point = paths[&child][0].points()[0];
        assert_abs_diff_eq!(point.x, 105.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn clustered_build_reports_progress_over_all_roots() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        let mut trace = Trace::from_events(
            vec![
                added(0.0, a),
                added(0.0, b),
                update(0.1, a, 1.0, 0.0),
                update(0.2, b, 2.0, 0.0),
            ],
            None,
        );
        trace.fill_parents();
        let roots = trace.roots(false);
        let clusters = crate::cluster::cluster(&trace, 2);
        assert_eq!(clusters.len(), 2);

        let mut seen = Vec::new();
        let mut sink = |current: usize, total: usize| seen.push((current, total));
        let paths = MotionAssembler::default().build_clustered(&clusters, &roots, &mut sink);

        assert_eq!(paths.len(), 2);
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn covering_segment_prefers_containing_range() {
        let early = MotionPath::new(0.0, vec![(0.0, Vec3::ZERO), (1.0, Vec3::ZERO)]);
        let late = MotionPath::new(0.0, vec![(5.0, Vec3::ZERO), (6.0, Vec3::ZERO)]);
        let paths = vec![early.clone(), late.clone()];

        assert_eq!(covering_segment(&paths, 0.5), Some(&early));
        assert_eq!(covering_segment(&paths, 5.5), Some(&late));
        assert_eq!(covering_segment(&paths, 3.0), Some(&early));
        assert_eq!(covering_segment(&paths, -1.0), Some(&early));
    }
}
