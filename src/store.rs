//! In-memory record store
//!
//! A `RecordStore` owns the canonical record set produced by the importers and
//! guarantees date-ascending order, which the trend and overload analysis rely
//! on. All filters return new stores; the original is never modified.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{exercise_key, WorkoutRecord};

/// Date-sorted, immutable collection of workout records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<WorkoutRecord>,
}

/// Overview of a loaded dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub total_records: usize,
    pub unique_exercises: usize,
    pub exercises: Vec<String>,
    pub date_range: (NaiveDate, NaiveDate),
    /// Calendar days spanned, both ends inclusive
    pub total_days: i64,
}

impl RecordStore {
    /// Build a store, stably sorting by date
    pub fn new(mut records: Vec<WorkoutRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkoutRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<WorkoutRecord> {
        self.records
    }

    /// Records for one exercise (case-insensitive)
    pub fn filter_by_exercise(&self, exercise: &str) -> RecordStore {
        self.filtered(|r| r.is_exercise(exercise))
    }

    /// Records within an inclusive date range
    pub fn filter_by_date_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RecordStore {
        self.filtered(|r| {
            start.map_or(true, |s| r.date >= s) && end.map_or(true, |e| r.date <= e)
        })
    }

    /// Records within an inclusive rep range
    pub fn filter_by_rep_range(&self, min_reps: Option<u32>, max_reps: Option<u32>) -> RecordStore {
        self.filtered(|r| {
            min_reps.map_or(true, |min| r.reps >= min) && max_reps.map_or(true, |max| r.reps <= max)
        })
    }

    fn filtered<F>(&self, predicate: F) -> RecordStore
    where
        F: Fn(&WorkoutRecord) -> bool,
    {
        // Already sorted, filtering preserves the order
        RecordStore {
            records: self.records.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Sorted exercise names, one display form per case-insensitive name
    pub fn unique_exercises(&self) -> Vec<String> {
        let mut by_key: BTreeMap<String, String> = BTreeMap::new();
        for record in &self.records {
            by_key
                .entry(exercise_key(&record.exercise))
                .or_insert_with(|| record.exercise.clone());
        }

        let mut names: Vec<String> = by_key.into_values().collect();
        names.sort();
        names
    }

    /// First and last workout dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<StoreSummary> {
        let (start, end) = self.date_range()?;
        let exercises = self.unique_exercises();

        Some(StoreSummary {
            total_records: self.records.len(),
            unique_exercises: exercises.len(),
            exercises,
            date_range: (start, end),
            total_days: (end - start).num_days() + 1,
        })
    }
}

impl From<Vec<WorkoutRecord>> for RecordStore {
    fn from(records: Vec<WorkoutRecord>) -> Self {
        RecordStore::new(records)
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a WorkoutRecord;
    type IntoIter = std::slice::Iter<'a, WorkoutRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
