//! Pathtrace Core Library
//!
//! Reads object event traces recorded from a virtual world, rebuilds the
//! object hierarchy and turns object movement into motion paths that can be
//! squeezed, interpolated and exported.

pub mod assembler;
pub mod cluster;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod motion_path;
pub mod parents;
pub mod pipeline;
pub mod progress;
pub mod trace;
pub mod vec3;

// Re-export commonly used items at crate root
pub use assembler::MotionAssembler;
pub use cluster::cluster;
pub use config::{CoordinateFrame, ExportConfig};
pub use error::{Result, TraceError};
pub use event::{Event, EventKind, ObjectType};
pub use format::{ExportedWaypoint, format_motion_path, motion_path_filename, parse_motion_path};
pub use motion_path::MotionPath;
pub use parents::ParentFill;
pub use pipeline::{PreparedPath, load_trace, prepare_exports, write_exports};
pub use progress::{NoProgress, ProgressSink};
pub use trace::{Trace, TraceSummary};
pub use vec3::Vec3;
