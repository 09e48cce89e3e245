//! Structured per-set workout logs
//!
//! A structured log is a JSON array of entries that carry one rep count per
//! set plus optional unit, RPE and rest times. Entries are repaired with
//! [`StructuredLogValidator::fix`], checked with
//! [`StructuredLogValidator::validate`] and then flattened into canonical
//! [`WorkoutRecord`]s, either one per set or one per entry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::import::{has_extension, ImportFormat};
use crate::models::WorkoutRecord;

/// Weight unit as written in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lbs,
    Lb,
}

/// One exercise entry of a structured log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredEntry {
    /// `YYYY-MM-DD`
    pub date: String,
    pub exercise: String,
    pub sets: u32,
    /// Reps for each set in order
    pub reps: Vec<u32>,
    pub weight: f64,
    #[serde(default)]
    pub unit: Option<WeightUnit>,
    #[serde(default)]
    pub rpe: Option<f64>,
    /// Rest after each set as `M:SS`
    #[serde(default)]
    pub rest_times: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StructuredEntry {
    fn parsed_date(&self) -> Option<NaiveDate> {
        if self.date.len() != 10 {
            return None;
        }
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    fn label(&self, index: usize) -> String {
        format!("Entry {} ({})", index, self.exercise)
    }
}

/// Errors block an import; warnings are informational
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of repairing then validating a log
#[derive(Debug, Clone, PartialEq)]
pub struct FixOutcome {
    pub entries: Vec<StructuredEntry>,
    pub fixes: Vec<String>,
    pub report: ValidationReport,
}

/// `M:SS` or the literal `null`
fn is_rest_time(value: &str) -> bool {
    if value == "null" {
        return true;
    }
    match value.split_once(':') {
        Some((minutes, seconds)) => {
            !minutes.is_empty()
                && minutes.chars().all(|c| c.is_ascii_digit())
                && seconds.len() == 2
                && seconds.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

pub struct StructuredLogValidator;

impl StructuredLogValidator {
    /// Check every entry; `strict` also requires one rep count per set
    pub fn validate(entries: &[StructuredEntry], strict: bool) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (i, entry) in entries.iter().enumerate() {
            let label = entry.label(i);

            if entry.parsed_date().is_none() {
                report
                    .errors
                    .push(format!("{}: Invalid date '{}' (use YYYY-MM-DD)", label, entry.date));
            }
            if entry.exercise.trim().is_empty() {
                report.errors.push(format!("{}: exercise must not be empty", label));
            }
            if entry.sets < 1 {
                report.errors.push(format!("{}: sets must be at least 1", label));
            }
            if entry.reps.is_empty() {
                report.errors.push(format!("{}: reps must not be empty", label));
            } else if entry.reps.iter().any(|&r| r < 1) {
                report.errors.push(format!("{}: every rep count must be at least 1", label));
            }
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                report
                    .errors
                    .push(format!("{}: weight {} must not be negative", label, entry.weight));
            }
            if let Some(rpe) = entry.rpe {
                if !(1.0..=10.0).contains(&rpe) {
                    report.errors.push(format!("{}: RPE {} outside 1-10", label, rpe));
                } else if rpe < 5.0 {
                    report
                        .warnings
                        .push(format!("{}: RPE {} is very low (typical range 6-10)", label, rpe));
                }
            }

            if strict && entry.reps.len() != entry.sets as usize {
                report.errors.push(format!(
                    "{}: reps array length ({}) must match sets ({})",
                    label,
                    entry.reps.len(),
                    entry.sets
                ));
            }

            if let Some(rest_times) = &entry.rest_times {
                for rest in rest_times.iter().flatten() {
                    if !is_rest_time(rest) {
                        report
                            .errors
                            .push(format!("{}: invalid rest time '{}' (use M:SS)", label, rest));
                    }
                }

                let count = rest_times.len() as i64;
                let sets = i64::from(entry.sets);
                if count != sets - 1 && count != sets {
                    report.warnings.push(format!(
                        "{}: rest_times count ({}) unusual for {} sets",
                        label, count, sets
                    ));
                }
            }

            if entry.weight == 0.0 {
                report
                    .warnings
                    .push(format!("{}: weight is 0 (bodyweight exercise?)", label));
            }
        }

        debug!(
            entries = entries.len(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Structured log validated"
        );
        report
    }

    /// Repair common formatting slips, reporting each change
    pub fn fix(entries: &[StructuredEntry]) -> (Vec<StructuredEntry>, Vec<String>) {
        let mut fixes = Vec::new();
        let mut fixed = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            let mut entry = entry.clone();

            match entry.unit {
                Some(WeightUnit::Lb) => {
                    entry.unit = Some(WeightUnit::Lbs);
                    fixes.push(format!("Entry {}: Normalized unit 'lb' -> 'lbs'", i));
                }
                None => {
                    entry.unit = Some(WeightUnit::Kg);
                    fixes.push(format!("Entry {}: Added default unit 'kg'", i));
                }
                _ => {}
            }

            let sets = entry.sets as usize;
            if entry.reps.len() < sets {
                if let Some(&last) = entry.reps.last() {
                    entry.reps.resize(sets, last);
                    fixes.push(format!("Entry {}: Extended reps array to match {} sets", i, sets));
                }
            } else if entry.reps.len() > sets {
                entry.reps.truncate(sets);
                fixes.push(format!("Entry {}: Truncated reps array to match {} sets", i, sets));
            }

            if entry.notes.as_deref() == Some("") {
                entry.notes = None;
                fixes.push(format!("Entry {}: Converted empty notes to null", i));
            }

            fixed.push(entry);
        }

        (fixed, fixes)
    }

    /// Fix, then validate strictly
    pub fn validate_and_fix(entries: &[StructuredEntry]) -> FixOutcome {
        let (entries, fixes) = Self::fix(entries);
        let report = Self::validate(&entries, true);
        FixOutcome {
            entries,
            fixes,
            report,
        }
    }
}

/// Parse a structured log from JSON text
pub fn parse_log(json: &str) -> Result<Vec<StructuredEntry>, ImportError> {
    Ok(serde_json::from_str(json)?)
}

fn entry_date(entry: &StructuredEntry, index: usize) -> Result<NaiveDate, ImportError> {
    entry.parsed_date().ok_or_else(|| ImportError::Validation {
        errors: vec![format!(
            "{}: Invalid date '{}' (use YYYY-MM-DD)",
            entry.label(index),
            entry.date
        )],
    })
}

/// One record per set, each with `sets = 1`
///
/// Sets beyond the rep list reuse its last value; entries without reps are
/// skipped.
pub fn expand_per_set(entries: &[StructuredEntry]) -> Result<Vec<WorkoutRecord>, ImportError> {
    let mut records = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        let date = entry_date(entry, i)?;
        for set in 0..entry.sets as usize {
            let Some(&reps) = entry.reps.get(set).or(entry.reps.last()) else {
                continue;
            };
            records.push(WorkoutRecord {
                date,
                exercise: entry.exercise.clone(),
                sets: 1,
                reps,
                weight: entry.weight,
                rpe: entry.rpe,
                notes: entry.notes.clone(),
            });
        }
    }

    Ok(records)
}

/// One record per entry; differing rep counts collapse to their rounded mean
pub fn aggregate(entries: &[StructuredEntry]) -> Result<Vec<WorkoutRecord>, ImportError> {
    let mut records = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let date = entry_date(entry, i)?;
        let reps = match entry.reps.first() {
            None => 0,
            Some(&first) if entry.reps.iter().all(|&r| r == first) => first,
            Some(_) => {
                let total: u64 = entry.reps.iter().map(|&r| u64::from(r)).sum();
                (total as f64 / entry.reps.len() as f64).round_ties_even() as u32
            }
        };

        records.push(WorkoutRecord {
            date,
            exercise: entry.exercise.clone(),
            sets: entry.sets,
            reps,
            weight: entry.weight,
            rpe: entry.rpe,
            notes: entry.notes.clone(),
        });
    }

    Ok(records)
}

/// Importer for `.json` structured logs
///
/// Entries are fixed and strictly validated before aggregation; any
/// validation error rejects the whole file.
pub struct StructuredLogImporter;

impl StructuredLogImporter {
    pub fn new() -> Self {
        Self
    }

    pub fn import_str(&self, json: &str) -> Result<Vec<WorkoutRecord>, ImportError> {
        let entries = parse_log(json)?;
        let outcome = StructuredLogValidator::validate_and_fix(&entries);

        for fix in &outcome.fixes {
            debug!(fix = %fix, "Applied structured log fix");
        }
        for warning in &outcome.report.warnings {
            warn!(warning = %warning, "Structured log warning");
        }

        if !outcome.report.is_valid() {
            return Err(ImportError::Validation {
                errors: outcome.report.errors,
            });
        }

        aggregate(&outcome.entries)
    }
}

impl Default for StructuredLogImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for StructuredLogImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<WorkoutRecord>, ImportError> {
        let json = fs::read_to_string(file_path).map_err(|source| ImportError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        self.import_str(&json)
    }

    fn get_format_name(&self) -> &'static str {
        "Structured JSON"
    }
}
