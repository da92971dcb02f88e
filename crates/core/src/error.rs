use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Malformed trace: {reason}")]
    MalformedTrace { reason: String },

    #[error("Malformed trace record {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Motion path has no waypoints")]
    EmptyPath,

    #[error("Cannot place time {time} on a motion path")]
    InvalidTime { time: f64 },

    #[error("Resample interval must be positive, got {interval}")]
    InvalidInterval { interval: f64 },

    #[error("Invalid export config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Malformed motion path line {line}: {reason}")]
    MalformedExport { line: usize, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TraceError>;
