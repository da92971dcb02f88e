use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    assembler::MotionAssembler,
    cluster::cluster,
    config::ExportConfig,
    error::Result,
    format::{format_motion_path, motion_path_filename},
    motion_path::MotionPath,
    progress::ProgressSink,
    trace::Trace,
};

/// A squeezed root path ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPath {
    pub object_id: Uuid,
    pub segment: usize,
    pub path: MotionPath,
}

impl PreparedPath {
    pub fn filename(&self) -> String {
        motion_path_filename(&self.object_id, self.segment)
    }
}

/// Load a trace file without blocking the runtime.
pub async fn load_trace(path: &Path, start_time: Option<f64>) -> Result<Trace> {
    let json = fs::read_to_string(path).await?;
    let trace = Trace::from_json_str(&json, start_time)?;
    info!(path = %path.display(), events = trace.len(), "loaded trace");
    Ok(trace)
}

/// Resolve parents, assemble every root's segments and squeeze them.
///
/// Output is ordered by object id then segment. Paths left with fewer than
/// `config.min_waypoints` waypoints are dropped.
pub fn prepare_exports(
    trace: &mut Trace,
    config: &ExportConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<PreparedPath>> {
    config.validate()?;
    trace.fill_parents();

    let roots = trace.roots(config.include_ambiguous_roots);
    let clusters = cluster(trace, config.cluster_events);
    let assembler = MotionAssembler::new(config.frame);
    let mut built = assembler.build_clustered(&clusters, &roots, progress);

    let mut prepared = Vec::new();
    let mut skipped = 0;

    for &object_id in &roots {
        let Some(segments) = built.remove(&object_id) else {
            continue;
        };
        for (segment, mut path) in segments.into_iter().enumerate() {
            path.squeeze(config.squeeze_tolerance);
            if let Some(interval) = config.resample_interval {
                path = path.resample(interval)?;
            }
            if path.len() < config.min_waypoints {
                skipped += 1;
                continue;
            }
            prepared.push(PreparedPath {
                object_id,
                segment,
                path,
            });
        }
    }

    debug!(
        roots = roots.len(),
        paths = prepared.len(),
        skipped,
        "prepared motion paths"
    );
    Ok(prepared)
}

/// Write each path to `out_dir`, creating the directory if needed.
pub async fn write_exports(out_dir: &Path, paths: &[PreparedPath]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).await?;

    let mut written = Vec::with_capacity(paths.len());
    for prepared in paths {
        let file = out_dir.join(prepared.filename());
        fs::write(&file, format_motion_path(&prepared.path)).await?;
        written.push(file);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::{Event, EventKind},
        progress::NoProgress,
        vec3::Vec3,
    };

    fn update(time: f64, id: Uuid, x: f64) -> Event {
        Event::new(EventKind::Updated, time)
            .with_object(id)
            .with_position(Vec3::new(x, 0.0, 0.0))
    }

    fn sample_trace() -> Trace {
        let root = Uuid::from_u128(1);
        let child = Uuid::from_u128(2);
        let still = Uuid::from_u128(3);

        Trace::from_events(
            vec![
                Event::new(EventKind::Added, 0.0).with_object(root).with_local(9),
                Event::new(EventKind::Added, 0.0)
                    .with_object(child)
                    .with_parent_local(9),
                Event::new(EventKind::Added, 0.0).with_object(still),
                update(0.1, root, 0.0),
                update(0.2, root, 0.0),
                update(0.3, root, 1.0),
                update(0.3, child, 5.0),
                update(0.4, child, 6.0),
                update(0.4, still, 2.0),
                update(0.5, still, 2.0),
            ],
            None,
        )
    }

    #[test]
    fn only_roots_with_enough_waypoints_are_exported() {
        let mut trace = sample_trace();
        let prepared = prepare_exports(&mut trace, &ExportConfig::default(), &mut NoProgress)
            .unwrap();

        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].object_id, Uuid::from_u128(1));
        assert_eq!(prepared[0].path.timestamps(), &[0.1, 0.3]);
        assert!(trace.parents_filled());
    }

    #[test]
    fn lower_threshold_keeps_stationary_roots() {
        let mut trace = sample_trace();
        let config = ExportConfig {
            min_waypoints: 1,
            ..Default::default()
        };
        let prepared = prepare_exports(&mut trace, &config, &mut NoProgress).unwrap();

        let ids: Vec<_> = prepared.iter().map(|p| p.object_id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(1), Uuid::from_u128(3)]);
    }

    #[test]
    fn resampling_runs_after_squeeze() {
        let mut trace = sample_trace();
        let config = ExportConfig {
            resample_interval: Some(0.1),
            ..Default::default()
        };
        let prepared = prepare_exports(&mut trace, &config, &mut NoProgress).unwrap();

        assert_eq!(prepared[0].path.len(), 3);
    }

    #[tokio::test]
    async fn load_trace_reads_json_file() {
        let file = std::env::temp_dir().join(format!("pathtrace-trace-{}.json", Uuid::new_v4()));
        fs::write(
            &file,
            r#"[{ "event": "started", "time": "40ms" },
                { "event": "add", "time": "50ms", "id": "00000000-0000-0000-0000-000000000001" }]"#,
        )
        .await
        .unwrap();

        let trace = load_trace(&file, None).await.unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.start_time(), Some(0.04));
        assert_eq!(trace.objects().len(), 1);

        fs::write(&file, "{}").await.unwrap();
        assert!(matches!(
            load_trace(&file, None).await,
            Err(crate::error::TraceError::MalformedTrace { .. })
        ));

        fs::remove_file(&file).await.unwrap();
    }

    #[test]
    fn invalid_config_is_rejected_before_work() {
        let mut trace = sample_trace();
        let config = ExportConfig {
            squeeze_tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(prepare_exports(&mut trace, &config, &mut NoProgress).is_err());
        assert!(!trace.parents_filled());
    }
}
