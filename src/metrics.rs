//! Strength and volume metrics
//!
//! Pure functions over the canonical record set:
//! - estimated one-rep max (Epley, Brzycki, Lombardi)
//! - volume per row, per exercise and per date
//! - strength progression and best-set session estimates
//! - personal records and series summaries used by the chart layer
//!
//! Exercise names are matched case-insensitively throughout, including the
//! per-exercise volume grouping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{exercise_key, SeriesPoint, StrengthPoint, WorkoutRecord};

/// One-rep max estimation formulas
///
/// All three are most accurate up to about 12 reps. Higher rep counts still
/// produce a value; interpreting it is up to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OneRepMaxFormula {
    /// weight × (1 + reps/30)
    #[default]
    Epley,
    /// weight × 36 / (37 − reps), undefined from 37 reps up
    Brzycki,
    /// weight × reps^0.1
    Lombardi,
}

impl OneRepMaxFormula {
    pub const ALL: [OneRepMaxFormula; 3] = [
        OneRepMaxFormula::Epley,
        OneRepMaxFormula::Brzycki,
        OneRepMaxFormula::Lombardi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OneRepMaxFormula::Epley => "epley",
            OneRepMaxFormula::Brzycki => "brzycki",
            OneRepMaxFormula::Lombardi => "lombardi",
        }
    }

    /// Apply the formula; `reps` is already known to be at least 2
    fn apply(&self, weight: f64, reps: u32) -> AnalysisResult<f64> {
        let r = f64::from(reps);
        match self {
            OneRepMaxFormula::Epley => Ok(weight * (1.0 + r / 30.0)),
            OneRepMaxFormula::Brzycki => {
                if reps >= 37 {
                    return Err(AnalysisError::invalid_input(
                        "reps",
                        reps,
                        "Brzycki formula not valid for reps >= 37",
                    ));
                }
                Ok(weight * 36.0 / (37.0 - r))
            }
            OneRepMaxFormula::Lombardi => Ok(weight * r.powf(0.1)),
        }
    }
}

impl fmt::Display for OneRepMaxFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OneRepMaxFormula {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "epley" => Ok(OneRepMaxFormula::Epley),
            "brzycki" => Ok(OneRepMaxFormula::Brzycki),
            "lombardi" => Ok(OneRepMaxFormula::Lombardi),
            _ => Err(AnalysisError::invalid_input(
                "formula",
                s,
                "Invalid formula, must be 'epley', 'brzycki', or 'lombardi'",
            )),
        }
    }
}

/// Estimate a one-rep max from a sub-maximal set
///
/// A single rep is returned as-is. Bodyweight sets (`weight == 0`) are
/// rejected like any other non-positive weight.
///
/// # Errors
/// `InvalidInput` when `weight <= 0`, `reps == 0`, or Brzycki with 37+ reps.
pub fn estimate_one_rep_max(weight: f64, reps: u32, formula: OneRepMaxFormula) -> AnalysisResult<f64> {
    if weight.is_nan() || weight <= 0.0 {
        return Err(AnalysisError::invalid_input(
            "weight",
            weight,
            "Weight must be positive",
        ));
    }
    if reps == 0 {
        return Err(AnalysisError::invalid_input(
            "reps",
            reps,
            "Reps must be greater than 0",
        ));
    }
    if reps == 1 {
        return Ok(weight);
    }
    formula.apply(weight, reps)
}

/// sets × reps × weight
pub fn total_volume(sets: u32, reps: u32, weight: f64) -> f64 {
    f64::from(sets) * f64::from(reps) * weight
}

/// Sum of row volume over all records
pub fn records_volume(records: &[WorkoutRecord]) -> f64 {
    records.iter().map(WorkoutRecord::volume).sum()
}

/// Total volume per exercise
///
/// Names that differ only in case are one exercise; the key is the spelling
/// of the first row seen.
pub fn aggregate_volume_by_exercise(records: &[WorkoutRecord]) -> BTreeMap<String, f64> {
    let mut by_key: BTreeMap<String, (String, f64)> = BTreeMap::new();

    for record in records {
        let entry = by_key
            .entry(exercise_key(&record.exercise))
            .or_insert_with(|| (record.exercise.clone(), 0.0));
        entry.1 += record.volume();
    }

    by_key.into_values().collect()
}

/// Daily volume, one point per distinct date in ascending order
pub fn volume_over_time(records: &[WorkoutRecord], exercise: Option<&str>) -> Vec<SeriesPoint> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for record in records
        .iter()
        .filter(|r| exercise.map_or(true, |name| r.is_exercise(name)))
    {
        *daily.entry(record.date).or_insert(0.0) += record.volume();
    }

    daily
        .into_iter()
        .map(|(date, value)| SeriesPoint::new(date, value))
        .collect()
}

/// Best estimated 1RM and heaviest weight per date for one exercise
///
/// `reps` on each point is taken from the first row of that date.
pub fn strength_progression(
    records: &[WorkoutRecord],
    exercise: &str,
    formula: OneRepMaxFormula,
) -> AnalysisResult<Vec<StrengthPoint>> {
    let mut daily: BTreeMap<NaiveDate, StrengthPoint> = BTreeMap::new();

    for record in records.iter().filter(|r| r.is_exercise(exercise)) {
        let estimate = estimate_one_rep_max(record.weight, record.reps, formula)?;

        daily
            .entry(record.date)
            .and_modify(|point| {
                point.max_weight = point.max_weight.max(record.weight);
                point.estimated_1rm = point.estimated_1rm.max(estimate);
            })
            .or_insert(StrengthPoint {
                date: record.date,
                max_weight: record.weight,
                reps: record.reps,
                estimated_1rm: estimate,
            });
    }

    debug!(exercise, %formula, sessions = daily.len(), "Strength progression computed");
    Ok(daily.into_values().collect())
}

/// Estimated 1RM of the best set in one session
///
/// The ranking key is the formula estimate, not the raw weight.
///
/// # Errors
/// `NotFound` when no rows match the exercise and date.
pub fn estimate_1rm_from_session(
    records: &[WorkoutRecord],
    exercise: &str,
    date: NaiveDate,
    formula: OneRepMaxFormula,
) -> AnalysisResult<f64> {
    let mut best: Option<f64> = None;

    for record in records
        .iter()
        .filter(|r| r.date == date && r.is_exercise(exercise))
    {
        let estimate = estimate_one_rep_max(record.weight, record.reps, formula)?;
        best = Some(best.map_or(estimate, |b| b.max(estimate)));
    }

    best.ok_or_else(|| AnalysisError::not_found(exercise, Some(date)))
}

/// Mean reps per row for each date of one exercise
pub fn average_reps_over_time(records: &[WorkoutRecord], exercise: &str) -> Vec<SeriesPoint> {
    let mut daily: BTreeMap<NaiveDate, (u64, usize)> = BTreeMap::new();

    for record in records.iter().filter(|r| r.is_exercise(exercise)) {
        let entry = daily.entry(record.date).or_insert((0, 0));
        entry.0 += u64::from(record.reps);
        entry.1 += 1;
    }

    daily
        .into_iter()
        .map(|(date, (total, rows))| SeriesPoint::new(date, total as f64 / rows as f64))
        .collect()
}

/// Sessions that set a new estimated 1RM
///
/// A point counts when it equals the running maximum and beats the
/// previous session's estimate.
pub fn personal_records(progression: &[StrengthPoint]) -> Vec<StrengthPoint> {
    let mut running_max = f64::NEG_INFINITY;
    let mut previous = 0.0;
    let mut records = Vec::new();

    for point in progression {
        running_max = running_max.max(point.estimated_1rm);
        if point.estimated_1rm == running_max && point.estimated_1rm > previous {
            records.push(*point);
        }
        previous = point.estimated_1rm;
    }

    records
}

/// Start-to-end statistics of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub average: f64,
    pub total: f64,
    pub start: f64,
    pub end: f64,
    pub change: f64,
    /// Percent change relative to `start`, 0 when `start <= 0`
    pub change_pct: f64,
}

impl SeriesSummary {
    /// Needs at least two points
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }

        let total: f64 = values.iter().sum();
        let start = values[0];
        let end = values[values.len() - 1];
        let change = end - start;

        Some(SeriesSummary {
            average: total / values.len() as f64,
            total,
            start,
            end,
            change,
            change_pct: if start > 0.0 { change / start * 100.0 } else { 0.0 },
        })
    }

    pub fn from_series(series: &[SeriesPoint]) -> Option<Self> {
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        Self::from_values(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn record(day: u32, exercise: &str, sets: u32, reps: u32, weight: f64) -> WorkoutRecord {
        WorkoutRecord::new(d(day), exercise, sets, reps, weight)
    }

    #[test]
    fn test_one_rep_max_formulas() {
        let epley = estimate_one_rep_max(100.0, 10, OneRepMaxFormula::Epley).unwrap();
        assert!((epley - 133.33).abs() < 0.01);

        let brzycki = estimate_one_rep_max(100.0, 10, OneRepMaxFormula::Brzycki).unwrap();
        assert!((brzycki - 133.33).abs() < 0.01);

        let lombardi = estimate_one_rep_max(100.0, 10, OneRepMaxFormula::Lombardi).unwrap();
        assert!((lombardi - 125.89).abs() < 0.01);
    }

    #[test]
    fn test_default_formula_is_epley() {
        assert_eq!(OneRepMaxFormula::default(), OneRepMaxFormula::Epley);
    }

    #[test]
    fn test_one_rep_returns_weight() {
        for formula in OneRepMaxFormula::ALL {
            assert_eq!(estimate_one_rep_max(100.0, 1, formula).unwrap(), 100.0);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            estimate_one_rep_max(100.0, 37, OneRepMaxFormula::Brzycki),
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(matches!(
            estimate_one_rep_max(100.0, 0, OneRepMaxFormula::Epley),
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(estimate_one_rep_max(-100.0, 10, OneRepMaxFormula::Epley).is_err());
        assert!(estimate_one_rep_max(0.0, 10, OneRepMaxFormula::Epley).is_err());
        assert!(estimate_one_rep_max(f64::NAN, 10, OneRepMaxFormula::Epley).is_err());

        // Brzycki still works right below its limit
        assert!(estimate_one_rep_max(100.0, 36, OneRepMaxFormula::Brzycki).is_ok());
    }

    #[test]
    fn test_high_reps_still_estimate() {
        let result = estimate_one_rep_max(100.0, 15, OneRepMaxFormula::Epley).unwrap();
        assert!(result > 100.0);
    }

    #[test]
    fn test_formula_parsing() {
        assert_eq!("epley".parse::<OneRepMaxFormula>().unwrap(), OneRepMaxFormula::Epley);
        assert_eq!("Brzycki".parse::<OneRepMaxFormula>().unwrap(), OneRepMaxFormula::Brzycki);
        assert_eq!(" lombardi ".parse::<OneRepMaxFormula>().unwrap(), OneRepMaxFormula::Lombardi);

        let err = "invalid".parse::<OneRepMaxFormula>().unwrap_err();
        assert!(err.to_string().contains("Invalid formula"));
    }

    #[test]
    fn test_total_volume() {
        assert_eq!(total_volume(3, 10, 100.0), 3000.0);
        assert_eq!(total_volume(0, 10, 100.0), 0.0);
        assert_eq!(total_volume(3, 0, 100.0), 0.0);
        assert_eq!(total_volume(3, 10, 0.0), 0.0);
    }

    #[test]
    fn test_records_volume() {
        let records = vec![
            record(1, "Squat", 3, 10, 100.0),
            record(1, "Squat", 4, 8, 120.0),
            record(1, "Squat", 3, 12, 90.0),
        ];
        assert_eq!(records_volume(&records), 10080.0);
    }

    #[test]
    fn test_volume_by_exercise() {
        let records = vec![
            record(1, "Squat", 3, 10, 100.0),
            record(1, "Squat", 4, 8, 120.0),
            record(1, "Bench", 3, 10, 80.0),
        ];

        let result = aggregate_volume_by_exercise(&records);
        assert_eq!(result.len(), 2);
        assert_eq!(result["Squat"], 6840.0);
        assert_eq!(result["Bench"], 2400.0);
    }

    #[test]
    fn test_volume_by_exercise_merges_case_variants() {
        let records = vec![
            record(1, "Squat", 1, 10, 100.0),
            record(2, "squat", 1, 10, 100.0),
        ];

        let result = aggregate_volume_by_exercise(&records);
        assert_eq!(result.len(), 1);
        assert_eq!(result["Squat"], 2000.0);
    }

    #[test]
    fn test_volume_over_time() {
        let records = vec![
            record(1, "Squat", 3, 10, 100.0),
            record(1, "Squat", 4, 8, 120.0),
            record(1, "Bench", 3, 10, 60.0),
            record(8, "squat", 3, 10, 110.0),
        ];

        let squat = volume_over_time(&records, Some("SQUAT"));
        assert_eq!(
            squat,
            vec![SeriesPoint::new(d(1), 6840.0), SeriesPoint::new(d(8), 3300.0)]
        );

        let all = volume_over_time(&records, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].value, 6840.0 + 1800.0);

        assert!(volume_over_time(&records, Some("Deadlift")).is_empty());
    }

    #[test]
    fn test_strength_progression() {
        let records = vec![
            record(1, "Squat", 3, 10, 100.0),
            record(8, "Squat", 3, 10, 105.0),
            record(15, "Squat", 3, 10, 110.0),
        ];

        let result = strength_progression(&records, "squat", OneRepMaxFormula::Epley).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.windows(2).all(|w| w[0].estimated_1rm < w[1].estimated_1rm));
    }

    #[test]
    fn test_strength_progression_groups_by_date() {
        let records = vec![
            record(1, "Squat", 1, 8, 100.0),
            record(1, "Squat", 1, 3, 120.0),
            record(1, "Squat", 1, 12, 80.0),
        ];

        let result = strength_progression(&records, "Squat", OneRepMaxFormula::Epley).unwrap();
        assert_eq!(result.len(), 1);

        let point = result[0];
        assert_eq!(point.max_weight, 120.0);
        assert_eq!(point.reps, 8);
        assert!((point.estimated_1rm - 132.0).abs() < 1e-9);
    }

    #[test]
    fn test_strength_progression_propagates_errors() {
        let records = vec![record(1, "Pull Up", 3, 10, 0.0)];
        assert!(strength_progression(&records, "pull up", OneRepMaxFormula::Epley).is_err());
        assert!(strength_progression(&records, "squat", OneRepMaxFormula::Epley)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_estimate_1rm_from_session() {
        let records = vec![
            record(1, "Squat", 1, 10, 100.0),
            record(1, "Squat", 1, 8, 110.0),
            record(1, "Squat", 1, 6, 120.0),
        ];

        let result = estimate_1rm_from_session(&records, "Squat", d(1), OneRepMaxFormula::Epley).unwrap();
        assert!(result > 120.0);
    }

    #[test]
    fn test_estimate_1rm_uses_best_set() {
        let records = vec![
            record(1, "Bench", 1, 3, 100.0),
            record(1, "Bench", 1, 12, 70.0),
        ];

        let result = estimate_1rm_from_session(&records, "bench", d(1), OneRepMaxFormula::Epley).unwrap();
        let heavy_1rm = 100.0 * (1.0 + 3.0 / 30.0);
        assert!((result - heavy_1rm).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_1rm_not_found() {
        let records = vec![record(1, "Bench", 1, 3, 100.0)];

        let err = estimate_1rm_from_session(&records, "Bench", d(2), OneRepMaxFormula::Epley).unwrap_err();
        assert!(matches!(err, AnalysisError::NotFound { date: Some(_), .. }));
        assert!(estimate_1rm_from_session(&records, "Squat", d(1), OneRepMaxFormula::Epley).is_err());
    }

    #[test]
    fn test_average_reps_over_time() {
        let records = vec![
            record(1, "Squat", 1, 10, 100.0),
            record(1, "Squat", 1, 7, 100.0),
            record(8, "Squat", 1, 12, 90.0),
        ];

        let result = average_reps_over_time(&records, "squat");
        assert_eq!(
            result,
            vec![SeriesPoint::new(d(1), 8.5), SeriesPoint::new(d(8), 12.0)]
        );
    }

    #[test]
    fn test_personal_records() {
        let point = |day, e1rm| StrengthPoint {
            date: d(day),
            max_weight: 100.0,
            reps: 5,
            estimated_1rm: e1rm,
        };
        let progression = vec![
            point(1, 110.0),
            point(2, 115.0),
            point(3, 112.0),
            point(4, 115.0),
            point(5, 120.0),
        ];

        let prs: Vec<NaiveDate> = personal_records(&progression).iter().map(|p| p.date).collect();
        // Day 4 ties the max after a dip, which still counts
        assert_eq!(prs, vec![d(1), d(2), d(4), d(5)]);
        assert!(personal_records(&[]).is_empty());
    }

    #[test]
    fn test_series_summary() {
        let summary = SeriesSummary::from_values(&[100.0, 110.0, 120.0]).unwrap();
        assert_eq!(summary.average, 110.0);
        assert_eq!(summary.total, 330.0);
        assert_eq!(summary.change, 20.0);
        assert!((summary.change_pct - 20.0).abs() < 1e-9);

        assert!(SeriesSummary::from_values(&[100.0]).is_none());
        assert_eq!(SeriesSummary::from_values(&[0.0, 10.0]).unwrap().change_pct, 0.0);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_single_rep_is_identity(weight in 0.5f64..500.0) {
            for formula in OneRepMaxFormula::ALL {
                prop_assert_eq!(estimate_one_rep_max(weight, 1, formula).unwrap(), weight);
            }
        }

        #[test]
        fn test_epley_never_below_weight(weight in 0.5f64..500.0, reps in 2u32..=12) {
            let estimate = estimate_one_rep_max(weight, reps, OneRepMaxFormula::Epley).unwrap();
            prop_assert!(estimate >= weight);
        }

        #[test]
        fn test_volume_is_product(sets in 0u32..20, reps in 0u32..50, weight in 0.0f64..400.0) {
            prop_assert_eq!(
                total_volume(sets, reps, weight),
                f64::from(sets) * f64::from(reps) * weight
            );
        }

        #[test]
        fn test_exercise_volume_partitions_rows(
            rows in prop::collection::vec((0usize..3, 1u32..6, 1u32..15, 0u32..200), 0..40)
        ) {
            let names = ["Squat", "Bench", "Row"];
            let records: Vec<WorkoutRecord> = rows
                .iter()
                .map(|(i, sets, reps, w)| record(1, names[*i], *sets, *reps, f64::from(*w)))
                .collect();

            let by_exercise = aggregate_volume_by_exercise(&records);
            for (name, volume) in &by_exercise {
                let expected: f64 = records
                    .iter()
                    .filter(|r| r.exercise == *name)
                    .map(WorkoutRecord::volume)
                    .sum();
                prop_assert_eq!(*volume, expected);
            }
            let total: f64 = by_exercise.values().sum();
            prop_assert!((total - records_volume(&records)).abs() < 1e-6);
        }

        #[test]
        fn test_volume_over_time_sorted_unique(days in prop::collection::vec(1u32..28, 0..30)) {
            let records: Vec<WorkoutRecord> = days
                .iter()
                .map(|day| record(*day, "Squat", 3, 5, 100.0))
                .collect();

            let series = volume_over_time(&records, None);
            prop_assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        }
    }
}
