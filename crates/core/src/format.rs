use std::fmt::Write as _;

use uuid::Uuid;

use crate::{
    error::{Result, TraceError},
    motion_path::MotionPath,
    vec3::Vec3,
};

/// One line of an exported motion path file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportedWaypoint {
    pub index: usize,
    pub position: Vec3,
    pub time_ms: i64,
}

/// Seconds to whole milliseconds, truncated toward zero.
pub fn to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).trunc() as i64
}

/// Render `path` as `"<index>: <x>, <z>, <y>, <time_ms>"` lines.
///
/// Y and Z are swapped on the way out.
pub fn format_motion_path(path: &MotionPath) -> String {
    let mut out = String::with_capacity(path.len() * 48);
    for (index, (time, p)) in path.waypoints().enumerate() {
        let _ = writeln!(
            out,
            "{}: {:.6}, {:.6}, {:.6}, {}",
            index,
            p.x,
            p.z,
            p.y,
            to_millis(time)
        );
    }
    out
}

/// File name for the `segment`-th path of `object_id`.
pub fn motion_path_filename(object_id: &Uuid, segment: usize) -> String {
    match segment {
        0 => format!("{object_id}.txt"),
        k => format!("{object_id}-{k}.txt"),
    }
}

/// Read an exported file back, swapping Y and Z into trace order again.
/// Blank lines are skipped.
pub fn parse_motion_path(text: &str) -> Result<Vec<ExportedWaypoint>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| parse_line(line).map_err(|reason| TraceError::MalformedExport {
            line: n + 1,
            reason,
        }))
        .collect()
}

fn parse_line(line: &str) -> std::result::Result<ExportedWaypoint, String> {
    let (index, rest) = line
        .split_once(':')
        .ok_or_else(|| "missing ':' after index".to_string())?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad index {index:?}: {e}"))?;

    let fields: Vec<&str> = rest.split(',').map(str::trim).collect();
    let &[x, z, y, time] = fields.as_slice() else {
        return Err(format!("expected 4 fields, got {}", fields.len()));
    };

    let coord = |name: &str, value: &str| {
        value
            .parse::<f64>()
            .map_err(|e| format!("bad {name} {value:?}: {e}"))
    };
    let position = Vec3::new(coord("x", x)?, coord("y", y)?, coord("z", z)?);
    let time_ms = time
        .parse::<i64>()
        .map_err(|e| format!("bad time {time:?}: {e}"))?;

    Ok(ExportedWaypoint {
        index,
        position,
        time_ms,
    })
}
