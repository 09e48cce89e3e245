use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the canonical workout table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Session date
    pub date: NaiveDate,

    /// Exercise name as logged; compared case-insensitively
    pub exercise: String,

    /// Number of sets in this row
    pub sets: u32,

    /// Reps performed per set
    pub reps: u32,

    /// Load in kilograms, 0 for bodyweight
    pub weight: f64,

    /// Rate of perceived exertion (1-10)
    pub rpe: Option<f64>,

    /// Free-text notes
    pub notes: Option<String>,
}

impl WorkoutRecord {
    pub fn new(
        date: NaiveDate,
        exercise: impl Into<String>,
        sets: u32,
        reps: u32,
        weight: f64,
    ) -> Self {
        Self {
            date,
            exercise: exercise.into(),
            sets,
            reps,
            weight,
            rpe: None,
            notes: None,
        }
    }

    pub fn with_rpe(mut self, rpe: f64) -> Self {
        self.rpe = Some(rpe);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Row volume: sets x reps x weight
    pub fn volume(&self) -> f64 {
        crate::metrics::total_volume(self.sets, self.reps, self.weight)
    }

    /// Case-insensitive exercise match
    pub fn is_exercise(&self, name: &str) -> bool {
        exercise_key(&self.exercise) == exercise_key(name)
    }
}

/// Normalized comparison key for an exercise name
pub fn exercise_key(name: &str) -> String {
    name.to_lowercase()
}

/// One entry of a `(date, value)` time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Per-date strength aggregate for one exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthPoint {
    pub date: NaiveDate,

    /// Heaviest weight lifted that day
    pub max_weight: f64,

    /// Reps of the first row logged that day (pass-through, not aggregated)
    pub reps: u32,

    /// Best estimated 1RM of the day
    pub estimated_1rm: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_volume_and_matching() {
        let record = WorkoutRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "Bench Press",
            3,
            10,
            80.0,
        )
        .with_rpe(8.0)
        .with_notes("paused reps");

        assert_eq!(record.volume(), 2400.0);
        assert!(record.is_exercise("bench press"));
        assert!(record.is_exercise("BENCH PRESS"));
        assert!(!record.is_exercise("bench"));
        assert_eq!(record.rpe, Some(8.0));
        assert_eq!(record.notes.as_deref(), Some("paused reps"));
    }
}
