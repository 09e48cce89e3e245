//! Progressive overload detection
//!
//! Sessions are aggregated per date (summed volume, heaviest weight) and each
//! series is regressed against the session index. Classification is a fixed
//! priority rule, not a combined score: a weight slope above threshold wins
//! even when the volume slope is far larger.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::models::WorkoutRecord;
use crate::store::RecordStore;
use crate::trend::ordinal_slope;

/// Slope thresholds per session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverloadThresholds {
    /// kg per session on the heaviest weight
    pub weight_slope: f64,
    /// kg·reps per session on total volume
    pub volume_slope: f64,
}

impl Default for OverloadThresholds {
    fn default() -> Self {
        OverloadThresholds {
            weight_slope: 0.5,
            volume_slope: 50.0,
        }
    }
}

/// Kind of progression detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverloadKind {
    /// Heaviest weight is trending up
    Intensity,
    /// Total volume is trending up
    Volume,
    /// No progression, or not enough sessions to tell
    None,
}

impl fmt::Display for OverloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverloadKind::Intensity => write!(f, "intensity"),
            OverloadKind::Volume => write!(f, "volume"),
            OverloadKind::None => write!(f, "none"),
        }
    }
}

/// Result of an overload check for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverloadAssessment {
    pub has_overload: bool,
    pub kind: OverloadKind,
    pub detail: String,
    /// Distinct workout dates considered
    pub sessions: usize,
    pub weight_slope: Option<f64>,
    pub volume_slope: Option<f64>,
}

impl OverloadAssessment {
    fn insufficient(sessions: usize) -> Self {
        OverloadAssessment {
            has_overload: false,
            kind: OverloadKind::None,
            detail: "Insufficient data (need at least 2 workouts)".to_string(),
            sessions,
            weight_slope: None,
            volume_slope: None,
        }
    }
}

/// Progressive overload classifier
#[derive(Debug, Clone, Default)]
pub struct OverloadDetector {
    thresholds: OverloadThresholds,
}

impl OverloadDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: OverloadThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &OverloadThresholds {
        &self.thresholds
    }

    /// Classify progression for one exercise (case-insensitive)
    pub fn detect(&self, records: &[WorkoutRecord], exercise: &str) -> OverloadAssessment {
        let mut rows: Vec<&WorkoutRecord> = records.iter().filter(|r| r.is_exercise(exercise)).collect();
        rows.sort_by_key(|r| r.date);

        // date -> (summed volume, max weight)
        let mut daily: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
        for row in rows {
            let entry = daily.entry(row.date).or_insert((0.0, f64::NEG_INFINITY));
            entry.0 += row.volume();
            entry.1 = entry.1.max(row.weight);
        }

        let sessions = daily.len();
        if sessions < 2 {
            debug!(exercise, sessions, "Not enough sessions for overload detection");
            return OverloadAssessment::insufficient(sessions);
        }

        let volumes: Vec<f64> = daily.values().map(|(v, _)| *v).collect();
        let weights: Vec<f64> = daily.values().map(|(_, w)| *w).collect();

        // Two or more sessions always give x variance
        let (volume_slope, weight_slope) = match (ordinal_slope(&volumes), ordinal_slope(&weights)) {
            (Ok(v), Ok(w)) => (v, w),
            _ => return OverloadAssessment::insufficient(sessions),
        };

        debug!(exercise, sessions, weight_slope, volume_slope, "Overload slopes computed");

        let (has_overload, kind, detail) = if weight_slope > self.thresholds.weight_slope {
            (
                true,
                OverloadKind::Intensity,
                format!("Weight increasing by ~{:.2} per workout", weight_slope),
            )
        } else if volume_slope > self.thresholds.volume_slope {
            (
                true,
                OverloadKind::Volume,
                format!("Volume increasing by ~{:.2} per workout", volume_slope),
            )
        } else {
            (
                false,
                OverloadKind::None,
                "No significant progression detected".to_string(),
            )
        };

        OverloadAssessment {
            has_overload,
            kind,
            detail,
            sessions,
            weight_slope: Some(weight_slope),
            volume_slope: Some(volume_slope),
        }
    }

    /// Assess every exercise in the store in parallel, sorted by name
    pub fn detect_all(&self, store: &RecordStore) -> Vec<(String, OverloadAssessment)> {
        let exercises = store.unique_exercises();
        let records = store.records();

        let mut results: Vec<(String, OverloadAssessment)> = exercises
            .par_iter()
            .map(|exercise| (exercise.clone(), self.detect(records, exercise)))
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));

        info!(
            exercises = results.len(),
            progressing = results.iter().filter(|(_, a)| a.has_overload).count(),
            "Overload detection completed"
        );
        results
    }
}

/// Classify progression with the default thresholds
pub fn detect_progressive_overload(records: &[WorkoutRecord], exercise: &str) -> OverloadAssessment {
    OverloadDetector::new().detect(records, exercise)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_records(exercise: &str, sets: &[u32], reps: u32, weights: &[f64]) -> Vec<WorkoutRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        sets.iter()
            .zip(weights)
            .enumerate()
            .map(|(i, (s, w))| {
                WorkoutRecord::new(start + chrono::Duration::days(7 * i as i64), exercise, *s, reps, *w)
            })
            .collect()
    }

    #[test]
    fn test_detects_volume_increase() {
        let records = weekly_records("Squat", &[3, 4, 4], 10, &[100.0, 100.0, 100.0]);
        let result = detect_progressive_overload(&records, "Squat");

        assert!(result.has_overload);
        assert_eq!(result.kind, OverloadKind::Volume);
        assert!((result.volume_slope.unwrap() - 500.0).abs() < 1e-9);
        assert_eq!(result.detail, "Volume increasing by ~500.00 per workout");
    }

    #[test]
    fn test_detects_intensity_increase() {
        let records = weekly_records("Squat", &[3, 3, 3], 10, &[100.0, 105.0, 110.0]);
        let result = detect_progressive_overload(&records, "squat");

        assert!(result.has_overload);
        assert_eq!(result.kind, OverloadKind::Intensity);
        assert!((result.weight_slope.unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(result.sessions, 3);
    }

    #[test]
    fn test_intensity_takes_priority_over_volume() {
        // Volume rises by thousands per session, weight only by 1 kg
        let records = weekly_records("Squat", &[3, 10, 20], 10, &[100.0, 101.0, 102.0]);
        let result = detect_progressive_overload(&records, "Squat");

        assert_eq!(result.kind, OverloadKind::Intensity);
        assert!(result.volume_slope.unwrap() > result.weight_slope.unwrap());
    }

    #[test]
    fn test_no_progression() {
        let records = weekly_records("Squat", &[3, 3, 3], 10, &[100.0, 100.0, 100.0]);
        let result = detect_progressive_overload(&records, "Squat");

        assert!(!result.has_overload);
        assert_eq!(result.kind, OverloadKind::None);
        assert_eq!(result.detail, "No significant progression detected");
    }

    #[test]
    fn test_insufficient_data() {
        let records = weekly_records("Squat", &[3], 10, &[100.0]);
        let result = detect_progressive_overload(&records, "Squat");
        assert!(!result.has_overload);
        assert_eq!(result.kind, OverloadKind::None);
        assert!(result.detail.contains("Insufficient data"));

        // Several rows on a single date are still one session
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let same_day = vec![
            WorkoutRecord::new(date, "Squat", 3, 10, 100.0),
            WorkoutRecord::new(date, "Squat", 3, 10, 120.0),
        ];
        let result = detect_progressive_overload(&same_day, "Squat");
        assert!(!result.has_overload);
        assert_eq!(result.sessions, 1);

        assert_eq!(detect_progressive_overload(&[], "Squat").sessions, 0);
    }

    #[test]
    fn test_ordinal_index_ignores_spacing() {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let records = vec![
            WorkoutRecord::new(d(1, 1), "Bench", 3, 10, 60.0),
            WorkoutRecord::new(d(1, 2), "Bench", 3, 10, 61.0),
            WorkoutRecord::new(d(6, 1), "Bench", 3, 10, 62.0),
        ];
        let result = detect_progressive_overload(&records, "Bench");
        assert!((result.weight_slope.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut records = weekly_records("Squat", &[3, 3, 3], 10, &[100.0, 105.0, 110.0]);
        records.reverse();
        let result = detect_progressive_overload(&records, "Squat");
        assert_eq!(result.kind, OverloadKind::Intensity);
    }

    #[test]
    fn test_custom_thresholds() {
        let records = weekly_records("Squat", &[3, 3, 3], 10, &[100.0, 105.0, 110.0]);
        let detector = OverloadDetector::with_thresholds(OverloadThresholds {
            weight_slope: 10.0,
            volume_slope: 100.0,
        });

        // Volume goes 3000 -> 3150 -> 3300

        let result = detector.detect(&records, "Squat");
        assert_eq!(result.kind, OverloadKind::Volume);
    }

    #[test]
    fn test_detect_all() {
        let mut records = weekly_records("Squat", &[3, 3, 3], 10, &[100.0, 105.0, 110.0]);
        records.extend(weekly_records("Bench", &[3, 3, 3], 10, &[60.0, 60.0, 60.0]));
        records.extend(weekly_records("Row", &[3], 10, &[50.0]));
        let store = RecordStore::new(records);

        let results = OverloadDetector::new().detect_all(&store);
        let kinds: Vec<(&str, OverloadKind)> = results.iter().map(|(n, a)| (n.as_str(), a.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("Bench", OverloadKind::None),
                ("Row", OverloadKind::None),
                ("Squat", OverloadKind::Intensity),
            ]
        );
    }

    #[test]
    fn test_default_thresholds() {
        let thresholds = OverloadThresholds::default();
        assert_eq!(thresholds.weight_slope, 0.5);
        assert_eq!(thresholds.volume_slope, 50.0);
    }
}
