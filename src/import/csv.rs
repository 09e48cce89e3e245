use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::import::validation::{RawRow, RecordValidator};
use crate::import::{has_extension, ImportFormat};
use crate::models::WorkoutRecord;

const REQUIRED_COLUMNS: [&str; 5] = ["date", "exercise", "sets", "reps", "weight"];

/// CSV importer for tabular workout logs
///
/// Header names are matched case-insensitively through an alias table, so
/// exports from other tools (`Workout Date`, `Movement`, `Load`) load without
/// renaming.
pub struct CsvImporter {
    column_mapping: HashMap<String, &'static str>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut importer = Self {
            column_mapping: HashMap::new(),
        };

        importer.add_mapping("date", &["date", "day", "workout_date"]);
        importer.add_mapping("exercise", &["exercise", "movement", "lift"]);
        importer.add_mapping("sets", &["sets"]);
        importer.add_mapping("reps", &["reps", "repetitions"]);
        importer.add_mapping("weight", &["weight", "load", "weight_kg"]);
        importer.add_mapping("rpe", &["rpe"]);
        importer.add_mapping("notes", &["notes", "note", "comments"]);

        importer
    }

    fn add_mapping(&mut self, standard_name: &'static str, variations: &[&str]) {
        for variation in variations {
            self.column_mapping
                .insert(self.normalize_column_name(variation), standard_name);
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        name.trim().to_lowercase().replace([' ', '-'], "_")
    }

    /// Map header positions to canonical column names; first match wins
    fn map_headers(&self, headers: &StringRecord) -> Result<HashMap<&'static str, usize>, ImportError> {
        let mut column_indices = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            if let Some(standard) = self.column_mapping.get(&self.normalize_column_name(header)) {
                column_indices.entry(*standard).or_insert(index);
            }
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !column_indices.contains_key(*column))
            .map(|column| column.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ImportError::MissingColumns { columns: missing });
        }

        debug!(columns = ?column_indices, "Mapped CSV headers");
        Ok(column_indices)
    }

    /// Import records from any CSV reader
    ///
    /// Rows that fail cleaning are dropped with a warning; structural CSV
    /// errors abort the import.
    pub fn import_reader<R: Read>(&self, reader: R) -> Result<Vec<WorkoutRecord>, ImportError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let column_indices = self.map_headers(csv_reader.headers()?)?;
        let cell = |row: &StringRecord, column: &str| {
            column_indices
                .get(column)
                .and_then(|&index| row.get(index))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let mut records = Vec::new();
        let mut dropped = 0usize;

        for result in csv_reader.records() {
            let row = result?;
            let raw = RawRow {
                line: row.position().map(|p| p.line()).unwrap_or_default(),
                date: cell(&row, "date"),
                exercise: cell(&row, "exercise"),
                sets: cell(&row, "sets"),
                reps: cell(&row, "reps"),
                weight: cell(&row, "weight"),
                rpe: cell(&row, "rpe"),
                notes: cell(&row, "notes"),
            };

            match RecordValidator::clean(&raw) {
                Ok(record) => records.push(record),
                Err(issue) => {
                    dropped += 1;
                    warn!(line = raw.line, %issue, "Dropping invalid row");
                }
            }
        }

        debug!(kept = records.len(), dropped, "CSV rows cleaned");
        Ok(records)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<WorkoutRecord>, ImportError> {
        let file = File::open(file_path).map_err(|source| ImportError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        self.import_reader(file)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}

/// Write records in the canonical column layout
/// (`date,exercise,sets,reps,weight,rpe,notes`)
pub fn write_records<W: Write>(records: &[WorkoutRecord], writer: W) -> Result<(), ImportError> {
    let mut csv_writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write records to a CSV file, creating or truncating it
pub fn write_records_to_file(records: &[WorkoutRecord], path: &Path) -> Result<(), ImportError> {
    let file = File::create(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_records(records, file)
}
