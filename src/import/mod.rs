use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ImportError;
use crate::models::WorkoutRecord;
use crate::store::RecordStore;

pub mod csv;
pub mod structured;
pub mod validation;

/// Trait for importing workout records from different file formats
pub trait ImportFormat: Send + Sync {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import cleaned records from the file
    fn import_file(&self, file_path: &Path) -> Result<Vec<WorkoutRecord>, ImportError>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Extension check shared by the importers
pub(crate) fn has_extension(file_path: &Path, expected: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(structured::StructuredLogImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file into a date-sorted store, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<RecordStore, ImportError> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_string())
                    .unwrap_or_else(|| file_path.display().to_string()),
            })?;

        info!(
            file = %file_path.display(),
            format = importer.get_format_name(),
            "Importing workout data"
        );

        let records = importer.import_file(file_path)?;
        info!(records = records.len(), "Import completed");
        Ok(RecordStore::new(records))
    }

    /// Import every supported file in a directory into one store
    ///
    /// Files that fail to import are logged and skipped.
    pub fn import_directory(&self, dir_path: &Path) -> Result<RecordStore, ImportError> {
        let mut all_records = Vec::new();

        for file_path in self.collect_importable_files(dir_path)? {
            match self.import_file(&file_path) {
                Ok(store) => all_records.extend(store.into_records()),
                Err(e) => warn!(file = %file_path.display(), error = %e, "Skipping file"),
            }
        }

        Ok(RecordStore::new(all_records))
    }

    /// Collect all files that can be imported from a directory, sorted by path
    fn collect_importable_files(&self, dir_path: &Path) -> Result<Vec<PathBuf>, ImportError> {
        let io_error = |source| ImportError::Io {
            path: dir_path.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir_path).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && self.can_import_file(&path) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Check if this manager can import a given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers.iter().any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}
