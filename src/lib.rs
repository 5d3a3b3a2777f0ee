// Library interface for IntervalRS modules
// This allows integration tests and benches to access the core functionality

pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod session;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::AppConfig;
pub use editor::{velocity::VelocityTracker, DragTuning, Handle, IntervalEditor, PowerSide};
pub use error::{IntervalRsError, Result};
pub use export::{export_mrc, CourseHeader, ExportFormat, ExportOptions};
pub use import::{parse_mrc, ImportManager, MrcParseError, ParsedCourse};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{TrainingLoadCalculator, WorkoutMetrics};
pub use session::{EditorSession, RecomputeDebouncer};
pub use zones::PowerZone;
