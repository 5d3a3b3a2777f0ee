use crate::error::{IntervalRsError, Result};
use crate::models::ShapeLimits;
use std::path::Path;

pub mod mrc;

pub use mrc::{parse_mrc, MrcParseError, ParsedCourse};

/// Trait for importing workouts from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Parse file content already read into memory
    fn import_str(&self, content: &str, limits: &ShapeLimits) -> Result<ParsedCourse>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Course file importer
pub struct MrcImporter;

impl MrcImporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MrcImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for MrcImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("mrc"))
            .unwrap_or(false)
    }

    fn import_str(&self, content: &str, limits: &ShapeLimits) -> Result<ParsedCourse> {
        Ok(parse_mrc(content, limits)?)
    }

    fn get_format_name(&self) -> &'static str {
        "MRC"
    }
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
    limits: ShapeLimits,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new(limits: ShapeLimits) -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![Box::new(MrcImporter::new())];

        Self { importers, limits }
    }

    /// Import a single file, picking the importer from its extension
    pub fn import_file(&self, file_path: &Path) -> Result<ParsedCourse> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| IntervalRsError::UnsupportedFile(file_path.display().to_string()))?;

        tracing::info!(
            path = %file_path.display(),
            format = importer.get_format_name(),
            "importing course file"
        );

        let content = std::fs::read_to_string(file_path)?;
        importer.import_str(&content, &self.limits)
    }

    /// Check if this manager can import a given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers.iter().any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new(ShapeLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_can_import_by_extension() {
        let manager = ImportManager::default();
        assert!(manager.can_import_file(Path::new("workout.mrc")));
        assert!(manager.can_import_file(Path::new("WORKOUT.MRC")));
        assert!(!manager.can_import_file(Path::new("workout.zwo")));
        assert!(!manager.can_import_file(Path::new("workout")));
    }

    #[test]
    fn test_unsupported_file() {
        let manager = ImportManager::default();
        let err = manager.import_file(Path::new("ride.fit")).unwrap_err();
        assert!(matches!(err, IntervalRsError::UnsupportedFile(_)));
    }

    #[test]
    fn test_import_file() {
        let mut file = Builder::new().suffix(".mrc").tempfile().unwrap();
        write!(
            file,
            "[COURSE HEADER]\nVERSION = 2\nUNITS = ENGLISH\nDESCRIPTION =\nFILE NAME = t\n\
             MINUTES PERCENT\n[END COURSE HEADER]\n[COURSE DATA]\n0.00\t90\n5.00\t90\n[END COURSE DATA]"
        )
        .unwrap();

        let parsed = ImportManager::default().import_file(file.path()).unwrap();
        assert_eq!(parsed.workout.len(), 1);
        assert_eq!(parsed.workout.intervals()[0].duration, 300);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let mut file = Builder::new().suffix(".mrc").tempfile().unwrap();
        write!(file, "[COURSE HEADER]\nVERSION = 1\n").unwrap();

        let err = ImportManager::default().import_file(file.path()).unwrap_err();
        match err {
            IntervalRsError::MalformedFile(parse_err) => assert_eq!(parse_err.line(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
