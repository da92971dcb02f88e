//! Timestamped position sequences for a single object.
//!
//! Times are seconds relative to the trace start, which is kept alongside as
//! the path's `epoch`. Waypoints are stored as two parallel arrays so the
//! timestamp column can be binary searched directly.
//!
//! Empty paths are valid values: they can be built, squeezed and exported,
//! but anything that needs a position (`interpolate`, `bounds`, `resample`,
//! `start_time`, `end_time`) returns [`TraceError::EmptyPath`].

use crate::{
    error::{Result, TraceError},
    vec3::{self, Vec3},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotionPath {
    epoch: f64,
    timestamps: Vec<f64>,
    positions: Vec<Vec3>,
}

impl MotionPath {
    /// Build a path from `(time, position)` pairs already sorted by time.
    pub fn new(epoch: f64, waypoints: impl IntoIterator<Item = (f64, Vec3)>) -> Self {
        let (timestamps, positions) = waypoints.into_iter().unzip();
        Self {
            epoch,
            timestamps,
            positions,
        }
    }

    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn points(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn waypoints(&self) -> impl ExactSizeIterator<Item = (f64, Vec3)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.positions.iter().copied())
    }

    pub fn start_time(&self) -> Result<f64> {
        self.timestamps.first().copied().ok_or(TraceError::EmptyPath)
    }

    pub fn end_time(&self) -> Result<f64> {
        self.timestamps.last().copied().ok_or(TraceError::EmptyPath)
    }

    /// Append a waypoint. The caller keeps times non-decreasing.
    pub fn push(&mut self, time: f64, position: Vec3) {
        self.timestamps.push(time);
        self.positions.push(position);
    }

    /// Drop waypoints that did not move away from the last kept waypoint.
    ///
    /// With `tolerance == 0` positions must match exactly to be dropped,
    /// otherwise anything closer than `tolerance` is dropped. The first
    /// waypoint is always kept.
    pub fn squeeze(&mut self, tolerance: f64) -> &mut Self {
        if tolerance > 0.0 {
            self.retain_moving(vec3::delta_equals(tolerance));
        } else {
            self.retain_moving(vec3::equals);
        }
        self
    }

    fn retain_moving(&mut self, same: impl Fn(Option<&Vec3>, Option<&Vec3>) -> bool) {
        let mut timestamps = Vec::with_capacity(self.len());
        let mut positions: Vec<Vec3> = Vec::with_capacity(self.len());

        for (time, point) in self.waypoints() {
            if same(Some(&point), positions.last()) {
                continue;
            }
            timestamps.push(time);
            positions.push(point);
        }

        self.timestamps = timestamps;
        self.positions = positions;
    }

    /// Position at time `t`, linearly interpolated between waypoints.
    ///
    /// Times outside the path clamp to the first or last waypoint. When two
    /// waypoints share a timestamp the later one wins. A NaN `t` is rejected
    /// with [`TraceError::InvalidTime`].
    pub fn interpolate(&self, t: f64) -> Result<Vec3> {
        let (first_t, last_t) = match (self.timestamps.first(), self.timestamps.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(TraceError::EmptyPath),
        };
        if t.is_nan() {
            return Err(TraceError::InvalidTime { time: t });
        }

        if t <= first_t {
            return Ok(self.positions[0]);
        }
        if t >= last_t {
            return Ok(self.positions[self.len() - 1]);
        }

        // First index with a timestamp strictly after `t`. Only a NaN stored
        // timestamp can break 0 < cur < len, in which case `t` is unplaceable.
        let cur = self.timestamps.partition_point(|&ts| ts <= t);
        let Some(prev) = cur.checked_sub(1).filter(|_| cur < self.len()) else {
            return Err(TraceError::InvalidTime { time: t });
        };

        let (prev_t, cur_t) = (self.timestamps[prev], self.timestamps[cur]);
        let (prev_pos, cur_pos) = (self.positions[prev], self.positions[cur]);

        let span = cur_t - prev_t;
        if span <= 0.0 {
            return Ok(cur_pos);
        }

        let alpha = (t - prev_t) / span;
        Ok(vec3::add(
            &vec3::scale(&cur_pos, alpha),
            &vec3::scale(&prev_pos, 1.0 - alpha),
        ))
    }

    /// Sample the path every `interval` seconds from its first to its last
    /// timestamp. The last timestamp is always included.
    pub fn resample(&self, interval: f64) -> Result<MotionPath> {
        if interval <= 0.0 || !interval.is_finite() {
            return Err(TraceError::InvalidInterval { interval });
        }
        let start = self.start_time()?;
        let end = self.end_time()?;

        let mut out = MotionPath {
            epoch: self.epoch,
            ..Default::default()
        };

        let mut step = 0u64;
        loop {
            let t = start + interval * step as f64;
            if t >= end {
                break;
            }
            out.push(t, self.interpolate(t)?);
            step += 1;
        }
        out.push(end, self.interpolate(end)?);

        Ok(out)
    }

    /// Axis-aligned `(min, max)` corners of all waypoints.
    pub fn bounds(&self) -> Result<(Vec3, Vec3)> {
        let mut points = self.positions.iter();
        let first = *points.next().ok_or(TraceError::EmptyPath)?;
        Ok(points.fold((first, first), |(lo, hi), p| {
            (vec3::component_min(&lo, p), vec3::component_max(&hi, p))
        }))
    }

    /// Copy of this path with each waypoint offset by `parent`'s position at
    /// the same time. Turns parent-relative positions into absolute ones.
    pub fn translated_by(&self, parent: &MotionPath) -> Result<MotionPath> {
        let mut out = MotionPath {
            epoch: self.epoch,
            ..Default::default()
        };
        for (time, point) in self.waypoints() {
            out.push(time, point + parent.interpolate(time)?);
        }
        Ok(out)
    }
}
