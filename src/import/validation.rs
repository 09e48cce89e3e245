use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::models::WorkoutRecord;

/// Raw text fields of one input row, `None` for empty cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// Source line for diagnostics
    pub line: u64,
    pub date: Option<String>,
    pub exercise: Option<String>,
    pub sets: Option<String>,
    pub reps: Option<String>,
    pub weight: Option<String>,
    pub rpe: Option<String>,
    pub notes: Option<String>,
}

/// Reason a row was dropped during cleaning
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowIssue {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("unparseable {field}: '{value}'")]
    Unparseable { field: &'static str, value: String },

    #[error("{field} must be greater than 0")]
    NonPositive { field: &'static str },

    #[error("weight must not be negative, got {0}")]
    NegativeWeight(f64),
}

/// Turns raw rows into records that satisfy the canonical invariants
pub struct RecordValidator;

impl RecordValidator {
    /// Clean a row: date, exercise and weight must be present, sets and reps
    /// positive, weight non-negative
    pub fn clean(row: &RawRow) -> Result<WorkoutRecord, RowIssue> {
        let date_str = row.date.as_deref().ok_or(RowIssue::Missing("date"))?;
        let date = Self::parse_date(date_str).ok_or_else(|| RowIssue::Unparseable {
            field: "date",
            value: date_str.to_string(),
        })?;

        let exercise = row
            .exercise
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(RowIssue::Missing("exercise"))?;

        let weight = Self::parse_weight(row.weight.as_deref())?;
        let sets = Self::parse_count("sets", row.sets.as_deref())?;
        let reps = Self::parse_count("reps", row.reps.as_deref())?;

        Ok(WorkoutRecord {
            date,
            exercise: exercise.to_string(),
            sets,
            reps,
            weight,
            rpe: Self::parse_rpe(row.rpe.as_deref()),
            notes: row
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
    }

    /// Parse a calendar date, dropping any time component
    pub fn parse_date(value: &str) -> Option<NaiveDate> {
        let value = value.trim();

        let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
        for format in &date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Some(date);
            }
        }

        let datetime_formats = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S%.f",
        ];
        for format in &datetime_formats {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
                return Some(datetime.date());
            }
        }

        None
    }

    /// Whole positive count; integral floats such as "3.0" are accepted
    fn parse_count(field: &'static str, value: Option<&str>) -> Result<u32, RowIssue> {
        let value = value.ok_or(RowIssue::Missing(field))?.trim();
        let unparseable = || RowIssue::Unparseable {
            field,
            value: value.to_string(),
        };

        let count = match value.parse::<u32>() {
            Ok(count) => count,
            Err(_) => {
                let float = value.parse::<f64>().map_err(|_| unparseable())?;
                if float.fract() != 0.0 || float < 0.0 || float > f64::from(u32::MAX) {
                    return Err(unparseable());
                }
                float as u32
            }
        };

        if count == 0 {
            return Err(RowIssue::NonPositive { field });
        }
        Ok(count)
    }

    fn parse_weight(value: Option<&str>) -> Result<f64, RowIssue> {
        let value = value.ok_or(RowIssue::Missing("weight"))?.trim();
        let weight = value
            .parse::<f64>()
            .ok()
            .filter(|w| w.is_finite())
            .ok_or_else(|| RowIssue::Unparseable {
                field: "weight",
                value: value.to_string(),
            })?;

        if weight < 0.0 {
            return Err(RowIssue::NegativeWeight(weight));
        }
        Ok(weight)
    }

    /// RPE is optional; unparseable values and 0 (legacy "not recorded") map to `None`
    fn parse_rpe(value: Option<&str>) -> Option<f64> {
        value
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|rpe| rpe.is_finite() && *rpe > 0.0)
    }
}
