use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Result, TraceError};

/// Coordinate frame of assembled child paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateFrame {
    /// Child positions stay relative to their parent, as the tracer records them.
    #[default]
    Local,
    /// Child positions are offset by the parent's absolute position.
    Absolute,
}

impl CoordinateFrame {
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateFrame::Local => "local",
            CoordinateFrame::Absolute => "absolute",
        }
    }
}

/// Settings for turning a trace into exported motion path files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Distance under which consecutive positions count as unchanged.
    pub squeeze_tolerance: f64,
    /// Paths with fewer waypoints after squeezing are not written.
    pub min_waypoints: usize,
    pub frame: CoordinateFrame,
    pub include_ambiguous_roots: bool,
    /// Upper bound on events per cluster, 0 disables clustering.
    pub cluster_events: usize,
    /// Resample squeezed paths at this interval (seconds) before export.
    pub resample_interval: Option<f64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            squeeze_tolerance: 0.0,
            min_waypoints: 2,
            frame: CoordinateFrame::Local,
            include_ambiguous_roots: false,
            cluster_events: 250_000,
            resample_interval: None,
        }
    }
}

impl ExportConfig {
    /// Load a JSON config file. Missing keys take their default values.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).await?;
        let config: ExportConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.squeeze_tolerance.is_finite() || self.squeeze_tolerance < 0.0 {
            return Err(TraceError::InvalidConfig {
                reason: format!(
                    "squeeze_tolerance must be a non-negative number, got {}",
                    self.squeeze_tolerance
                ),
            });
        }
        if let Some(interval) = self.resample_interval {
            if !interval.is_finite() || interval <= 0.0 {
                return Err(TraceError::InvalidConfig {
                    reason: format!("resample_interval must be positive, got {interval}"),
                });
            }
        }
        Ok(())
    }
}
