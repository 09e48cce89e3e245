//! Trend analysis over `(date, value)` series
//!
//! Two regressions live here and they use different independent variables:
//! - [`linear_trend`] regresses on calendar days since the first date, so the
//!   slope is "per day" and irregular spacing matters.
//! - [`ordinal_slope`] regresses on the 0-based position of each value, so the
//!   slope is "per session" regardless of spacing.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::SeriesPoint;

// Keeps the t statistic finite for a perfect correlation
const TINY: f64 = 1.0e-20;

/// Simple linear regression result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    /// Change in value per calendar day
    pub slope: f64,
    /// Value at the first date of the series
    pub intercept: f64,
    /// Squared Pearson correlation
    pub r_squared: f64,
    /// Two-sided p-value for a zero slope
    pub p_value: f64,
    /// Standard error of the slope
    pub std_err: f64,
}

/// Value of a trend line at a future date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub date: NaiveDate,
    pub value: f64,
}

/// Break between consecutive workouts longer than the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingGap {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: i64,
}

/// Centered sums shared by both regressions
struct LeastSquares {
    n: usize,
    slope: f64,
    intercept: f64,
    ss_xx: f64,
    ss_yy: f64,
    ss_xy: f64,
}

fn least_squares(x: &[f64], y: &[f64]) -> AnalysisResult<LeastSquares> {
    let n = x.len();
    if n < 2 {
        return Err(AnalysisError::invalid_input(
            "series",
            format!("{} points", n),
            "need at least 2 points for a regression",
        ));
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }

    if ss_xx == 0.0 {
        return Err(AnalysisError::invalid_input(
            "series",
            format!("{} points", n),
            "zero variance in x",
        ));
    }

    let slope = ss_xy / ss_xx;
    Ok(LeastSquares {
        n,
        slope,
        intercept: mean_y - slope * mean_x,
        ss_xx,
        ss_yy,
        ss_xy,
    })
}

/// Linear regression of value on calendar days since the earliest date
///
/// # Errors
/// `InvalidInput` for fewer than 2 points or when every point has the same date.
pub fn linear_trend(series: &[SeriesPoint]) -> AnalysisResult<LinearTrend> {
    let origin = series.iter().map(|p| p.date).min().ok_or_else(|| {
        AnalysisError::invalid_input("series", "0 points", "need at least 2 points for a regression")
    })?;

    let x: Vec<f64> = series
        .iter()
        .map(|p| (p.date - origin).num_days() as f64)
        .collect();
    let y: Vec<f64> = series.iter().map(|p| p.value).collect();

    let fit = least_squares(&x, &y)?;

    let r = if fit.ss_yy == 0.0 {
        0.0
    } else {
        (fit.ss_xy / (fit.ss_xx * fit.ss_yy).sqrt()).clamp(-1.0, 1.0)
    };

    let (p_value, std_err) = if fit.n == 2 {
        let p = if y[0] == y[1] { 1.0 } else { 0.0 };
        (p, 0.0)
    } else {
        let df = (fit.n - 2) as f64;
        let t = r * (df / ((1.0 - r + TINY) * (1.0 + r + TINY))).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| AnalysisError::Statistics(e.to_string()))?;
        let p = (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0);
        let se = ((1.0 - r * r) * fit.ss_yy / fit.ss_xx / df).max(0.0).sqrt();
        (p, se)
    };

    debug!(
        points = fit.n,
        slope = fit.slope,
        r_squared = r * r,
        "Linear trend fitted"
    );

    Ok(LinearTrend {
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: r * r,
        p_value,
        std_err,
    })
}

/// Least-squares slope of `values` against their index `0..n`
pub fn ordinal_slope(values: &[f64]) -> AnalysisResult<f64> {
    let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    Ok(least_squares(&x, values)?.slope)
}

/// Rolling mean aligned with the input
///
/// With `window >= 2` the first entry is `None`; entries before a full window
/// average everything seen so far, later entries average the trailing
/// `window` values. `window == 1` returns the values unchanged.
pub fn moving_average(series: &[SeriesPoint], window: usize) -> AnalysisResult<Vec<Option<f64>>> {
    if window == 0 {
        return Err(AnalysisError::invalid_input(
            "window",
            window,
            "window must be at least 1",
        ));
    }

    let values: Vec<f64> = series.iter().map(|p| p.value).collect();

    Ok((0..values.len())
        .map(|i| {
            if i == 0 && window > 1 {
                return None;
            }
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            Some(slice.iter().sum::<f64>() / slice.len() as f64)
        })
        .collect())
}

/// Extend the calendar-day trend `days_ahead` past the last date
pub fn project_next(series: &[SeriesPoint], days_ahead: u32) -> AnalysisResult<Projection> {
    let trend = linear_trend(series)?;

    // linear_trend succeeded, so the series has at least 2 points
    let (origin, last) = series.iter().fold((series[0].date, series[0].date), |(lo, hi), p| {
        (lo.min(p.date), hi.max(p.date))
    });

    let date = last + Duration::days(i64::from(days_ahead));
    let x = (date - origin).num_days() as f64;

    Ok(Projection {
        date,
        value: trend.intercept + trend.slope * x,
    })
}

/// Pairs of consecutive dates more than `threshold_days` apart
pub fn training_gaps(dates: &[NaiveDate], threshold_days: i64) -> Vec<TrainingGap> {
    dates
        .windows(2)
        .filter_map(|pair| {
            let days = (pair[1] - pair[0]).num_days();
            (days > threshold_days).then_some(TrainingGap {
                from: pair[0],
                to: pair[1],
                days,
            })
        })
        .collect()
}
