//! Trend analysis over windowed metric histories
//!
//! The analyzer is a pure function of its inputs: it extracts a numeric
//! series for one field, fits an ordinary least-squares line over the
//! sample index (0..n-1, not elapsed time), classifies the direction,
//! and projects one step past the last observation. Fewer than three
//! present points is a normal outcome, not an error, and yields no
//! result.

use crate::snapshot::MetricSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slope cutoff for the three-way classification
///
/// Applied as a strict inequality in both directions: a slope of
/// exactly ±0.1 classifies as stable. The cutoff is an absolute
/// constant shared by every metric regardless of unit or scale.
pub const SLOPE_THRESHOLD: f64 = 0.1;

/// Minimum series length for a prediction (and a full analysis)
pub const MIN_SERIES_LEN: usize = 3;

/// Coarse direction of a metric series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Slope above the positive cutoff
    Improving,
    /// Slope within the cutoff band, or too few points to tell
    Stable,
    /// Slope below the negative cutoff
    Degrading,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Stable => write!(f, "stable"),
            Trend::Degrading => write!(f, "degrading"),
        }
    }
}

/// Analysis outcome for one scalar metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Display label
    pub metric_name: String,
    /// Most recent present value in the window
    pub current_value: f64,
    /// Fitted direction
    pub trend: Trend,
    /// Forecast one step ahead; absent when the fit is not meaningful
    pub prediction: Option<f64>,
    /// Fixed per-metric trust weight in [0, 1], not statistically derived
    pub confidence: f64,
    /// Advice strings from the static rule tables
    pub recommendations: Vec<String>,
}

/// Ordered present numeric values of `field` across the window
///
/// Absent and non-numeric readings are skipped, not interpolated, so
/// the series may be shorter than the window.
pub fn extract_series(window: &[MetricSnapshot], field: &str) -> Vec<f64> {
    window.iter().filter_map(|snap| snap.number(field)).collect()
}

/// Least-squares line over x = 0..n-1, as (slope, intercept)
///
/// `None` for fewer than two points or a degenerate system.
fn linear_fit(series: &[f64]) -> Option<(f64, f64)> {
    let n = series.len() as f64;
    if n < 2.0 {
        return None;
    }

    let sum_x: f64 = (0..series.len()).map(|i| i as f64).sum();
    let sum_y: f64 = series.iter().sum();
    let sum_xy: f64 = series.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..series.len()).map(|i| (i as f64) * (i as f64)).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < 1e-12 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Some((slope, intercept))
}

/// Classify the direction of a series
///
/// Fewer than two points is stable by definition.
pub fn classify_trend(series: &[f64]) -> Trend {
    let Some((slope, _)) = linear_fit(series) else {
        return Trend::Stable;
    };

    if slope > SLOPE_THRESHOLD {
        Trend::Improving
    } else if slope < -SLOPE_THRESHOLD {
        Trend::Degrading
    } else {
        Trend::Stable
    }
}

/// Forecast the next value of a series, rounded to 2 decimal places
///
/// `None` for fewer than [`MIN_SERIES_LEN`] points: a two-point line
/// always fits perfectly and predicts nothing.
pub fn predict_next(series: &[f64]) -> Option<f64> {
    if series.len() < MIN_SERIES_LEN {
        return None;
    }

    let (slope, intercept) = linear_fit(series)?;
    let next_x = series.len() as f64;
    let prediction = slope * next_x + intercept;
    Some((prediction * 100.0).round() / 100.0)
}

/// Full analysis of one field over a window
///
/// Returns `None` when the extracted series has fewer than
/// [`MIN_SERIES_LEN`] present points — insufficient data is a normal
/// outcome. `rule` maps (trend, current value) to advice strings.
pub fn analyze(
    window: &[MetricSnapshot],
    field: &str,
    display_name: &str,
    confidence: f64,
    rule: impl Fn(Trend, f64) -> Vec<String>,
) -> Option<TrendResult> {
    let series = extract_series(window, field);
    if series.len() < MIN_SERIES_LEN {
        return None;
    }

    let current_value = *series.last()?;
    let trend = classify_trend(&series);
    let prediction = predict_next(&series);
    let recommendations = rule(trend, current_value);

    Some(TrendResult {
        metric_name: display_name.to_string(),
        current_value,
        trend,
        prediction,
        confidence,
        recommendations,
    })
}
