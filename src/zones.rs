use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{exercise_key, WorkoutRecord};

/// Inclusive rep range considered optimal for hypertrophy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepZone {
    pub min_reps: u32,
    pub max_reps: u32,
}

impl RepZone {
    pub const fn new(min_reps: u32, max_reps: u32) -> Self {
        Self { min_reps, max_reps }
    }

    pub fn contains(&self, reps: u32) -> bool {
        (self.min_reps..=self.max_reps).contains(&reps)
    }
}

/// Where a rep count sits relative to a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    Below,
    Within,
    Above,
}

/// Standard hypertrophy zone for exercises without a specific entry
pub const DEFAULT_HYPERTROPHY_ZONE: RepZone = RepZone::new(8, 12);

// Heavy compounds sit lower than the standard 8-12 range
const HYPERTROPHY_ZONES: &[(&str, RepZone)] = &[
    ("smith squat", RepZone::new(6, 10)),
    ("squat", RepZone::new(6, 10)),
    ("deadlift", RepZone::new(5, 8)),
    ("bench press", RepZone::new(6, 10)),
    ("hip thrust", RepZone::new(8, 12)),
    ("leg press", RepZone::new(8, 12)),
];

/// Zone lookup utilities
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// Exercise-specific hypertrophy zone (case-insensitive exact name)
    pub fn hypertrophy_zone(exercise: &str) -> RepZone {
        let key = exercise_key(exercise);
        HYPERTROPHY_ZONES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, zone)| *zone)
            .unwrap_or(DEFAULT_HYPERTROPHY_ZONE)
    }

    pub fn position(reps: u32, zone: &RepZone) -> ZonePosition {
        if reps < zone.min_reps {
            ZonePosition::Below
        } else if reps > zone.max_reps {
            ZonePosition::Above
        } else {
            ZonePosition::Within
        }
    }
}

/// Rep-count breakdown for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepDistribution {
    pub exercise: String,
    pub zone: RepZone,
    /// Logged rows per rep count
    pub counts: BTreeMap<u32, usize>,
    pub total_entries: usize,
    pub entries_in_zone: usize,
    pub in_zone_pct: f64,
    pub average_reps: f64,
}

impl RepDistribution {
    /// Average reps fall inside the zone
    pub fn average_in_zone(&self) -> bool {
        self.average_reps >= f64::from(self.zone.min_reps)
            && self.average_reps <= f64::from(self.zone.max_reps)
    }
}

/// Distribution analysis over logged sets
pub struct ZoneAnalyzer;

impl ZoneAnalyzer {
    /// Count rows per rep value and the share inside the hypertrophy zone
    ///
    /// # Errors
    /// `NotFound` when no rows match the exercise.
    pub fn rep_distribution(records: &[WorkoutRecord], exercise: &str) -> AnalysisResult<RepDistribution> {
        let zone = ZoneCalculator::hypertrophy_zone(exercise);
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        let mut rep_total: u64 = 0;

        for record in records.iter().filter(|r| r.is_exercise(exercise)) {
            *counts.entry(record.reps).or_insert(0) += 1;
            rep_total += u64::from(record.reps);
        }

        let total_entries: usize = counts.values().sum();
        if total_entries == 0 {
            return Err(AnalysisError::not_found(exercise, None));
        }

        let entries_in_zone: usize = counts
            .iter()
            .filter(|(reps, _)| zone.contains(**reps))
            .map(|(_, count)| count)
            .sum();

        Ok(RepDistribution {
            exercise: exercise.to_string(),
            zone,
            counts,
            total_entries,
            entries_in_zone,
            in_zone_pct: entries_in_zone as f64 / total_entries as f64 * 100.0,
            average_reps: rep_total as f64 / total_entries as f64,
        })
    }
}
