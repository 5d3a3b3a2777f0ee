use crate::models::Workout;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub mod mrc;

pub use mrc::{export_mrc, CourseHeader};

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Piecewise-linear minutes/percent course file
    Mrc,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, ExportError> {
        match s.to_lowercase().as_str() {
            "mrc" => Ok(ExportFormat::Mrc),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Mrc => "mrc",
        }
    }
}

/// Export configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub header: CourseHeader,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            format: ExportFormat::Mrc,
            header: CourseHeader::default(),
        }
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Render the workout in the requested format
pub fn render(workout: &Workout, options: &ExportOptions) -> String {
    match options.format {
        ExportFormat::Mrc => export_mrc(workout, &options.header),
    }
}

/// Render the workout and write it to `output_path`
pub fn export_to_path<P: AsRef<Path>>(
    workout: &Workout,
    options: &ExportOptions,
    output_path: P,
) -> Result<(), ExportError> {
    let content = render(workout, options);

    let mut file = std::fs::File::create(output_path.as_ref())?;
    file.write_all(content.as_bytes())?;

    tracing::info!(
        path = %output_path.as_ref().display(),
        format = ?options.format,
        intervals = workout.len(),
        "workout exported"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interval, ShapeLimits};
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::from_str("MRC").unwrap(), ExportFormat::Mrc);
        assert!(matches!(
            ExportFormat::from_str("zwo"),
            Err(ExportError::UnsupportedFormat(_))
        ));
        assert_eq!(ExportFormat::Mrc.extension(), "mrc");
    }

    #[test]
    fn test_export_to_path() {
        let workout = Workout::new().append(Interval::with_shape(100, 100, 60, &ShapeLimits::default()));
        let temp_file = NamedTempFile::new().unwrap();

        export_to_path(&workout, &ExportOptions::default(), temp_file.path()).unwrap();

        let written = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(written, render(&workout, &ExportOptions::default()));
        assert!(written.starts_with("[COURSE HEADER]\n"));
        assert!(written.ends_with("[END COURSE DATA]"));
    }
}
