//! Unified error hierarchy for IntervalRS
//!
//! Lookup misses on the workout collection are not errors: they resolve to
//! no-ops inside [`crate::models::Workout`]. What remains here are the
//! failures a user can actually see: rejected course files, export IO and
//! bad configuration.

use crate::export::ExportError;
use crate::import::mrc::MrcParseError;
use thiserror::Error;

/// Top-level error type for all IntervalRS operations
#[derive(Debug, Error)]
pub enum IntervalRsError {
    /// Course file rejected by the parser
    #[error("Malformed course file: {0}")]
    MalformedFile(#[from] MrcParseError),

    /// Export failures
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input handed to the editing session
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No importer understands the file
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),
}

/// Result type alias for IntervalRS operations
pub type Result<T> = std::result::Result<T, IntervalRsError>;

impl IntervalRsError {
    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            IntervalRsError::MalformedFile(err) => {
                format!("Could not read course file (line {}): {}", err.line(), err)
            }
            IntervalRsError::Configuration(reason) => {
                format!("Invalid configuration: {}. Check your config file.", reason)
            }
            _ => self.to_string(),
        }
    }
}
