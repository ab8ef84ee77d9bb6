//! Device analytics orchestrator
//!
//! Ties the snapshot producer, history store, and trend analyzer
//! together for one device: collect appends a fresh snapshot per
//! family, and analyze reads a trailing window of each history and
//! derives per-metric trend results. Metrics without enough data are
//! omitted from the result map, never reported as errors.

use crate::error::DevitalsResult;
use crate::history::HistoryStore;
use crate::producer::produce_snapshot;
use crate::rules;
use crate::snapshot::{MetricFamily, MetricSnapshot};
use crate::trend::{self, Trend, TrendResult};
use chrono::Duration;
use std::collections::BTreeMap;

// Fixed designer trust weights per metric, not statistically derived
const BATTERY_LEVEL_CONFIDENCE: f64 = 0.7;
const BATTERY_CYCLES_CONFIDENCE: f64 = 0.8;
const STORAGE_USAGE_CONFIDENCE: f64 = 0.9;
const THERMAL_CONFIDENCE: f64 = 0.6;

/// Thermal score above which the derived metric reads as stable
const THERMAL_STABLE_SCORE: f64 = 80.0;

/// Analytics facade for a single device
#[derive(Debug, Clone)]
pub struct DeviceAnalytics {
    udid: String,
    store: HistoryStore,
}

impl DeviceAnalytics {
    /// Create analytics over an explicit history store
    pub fn new(udid: impl Into<String>, store: HistoryStore) -> Self {
        DeviceAnalytics {
            udid: udid.into(),
            store,
        }
    }

    /// Create analytics over the default store location
    pub fn open(udid: impl Into<String>) -> DevitalsResult<Self> {
        Ok(Self::new(udid, HistoryStore::open_default()?))
    }

    /// The device this instance tracks
    pub fn udid(&self) -> &str {
        &self.udid
    }

    /// The backing history store
    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Collect one snapshot per family and append each to its history
    ///
    /// Returns the fresh snapshots keyed by family.
    pub async fn collect_snapshots(
        &self,
    ) -> DevitalsResult<BTreeMap<MetricFamily, MetricSnapshot>> {
        let mut collected = BTreeMap::new();

        for family in MetricFamily::ALL {
            let snapshot = produce_snapshot(&self.udid, family).await?;
            self.store.append(&self.udid, family, snapshot.clone())?;
            tracing::debug!(udid = %self.udid, %family, "appended snapshot");
            collected.insert(family, snapshot);
        }

        Ok(collected)
    }

    /// Trend results for every metric with enough history in the window
    ///
    /// The map is keyed by metric key (`battery_level`, `battery_cycles`,
    /// `storage_usage`, `thermal_performance`); metrics with fewer than
    /// three usable points are omitted.
    pub fn analyze_trends(&self, days: i64) -> DevitalsResult<BTreeMap<String, TrendResult>> {
        let since = Duration::days(days);
        let mut results = BTreeMap::new();

        let battery = self.store.window(&self.udid, MetricFamily::Battery, since)?;
        if let Some(result) = trend::analyze(
            &battery,
            "level",
            "Battery Level",
            BATTERY_LEVEL_CONFIDENCE,
            rules::battery_level_advice,
        ) {
            results.insert("battery_level".to_string(), result);
        }
        if let Some(result) = trend::analyze(
            &battery,
            "cycle_count",
            "Battery Cycles",
            BATTERY_CYCLES_CONFIDENCE,
            rules::battery_cycle_advice,
        ) {
            results.insert("battery_cycles".to_string(), result);
        }

        let storage = self.store.window(&self.udid, MetricFamily::Storage, since)?;
        if let Some(result) = trend::analyze(
            &storage,
            "usage_percent",
            "Storage Usage",
            STORAGE_USAGE_CONFIDENCE,
            rules::storage_usage_advice,
        ) {
            results.insert("storage_usage".to_string(), result);
        }

        let performance = self
            .store
            .window(&self.udid, MetricFamily::Performance, since)?;
        if let Some(result) = thermal_performance(&performance) {
            results.insert("thermal_performance".to_string(), result);
        }

        Ok(results)
    }
}

/// Derived thermal score over a performance window
///
/// The score is the share of readings that are neither "Normal" nor
/// "Fair", inverted onto 0-100. It is a state-frequency metric rather
/// than a fitted series: the trend is stable above
/// [`THERMAL_STABLE_SCORE`] and degrading otherwise, and no prediction
/// is produced. Requires at least three present thermal readings.
fn thermal_performance(window: &[MetricSnapshot]) -> Option<TrendResult> {
    let states: Vec<&str> = window
        .iter()
        .filter_map(|snap| snap.text("thermal_state"))
        .collect();

    if states.len() < trend::MIN_SERIES_LEN {
        return None;
    }

    let issues = states
        .iter()
        .filter(|state| !matches!(**state, "Normal" | "Fair"))
        .count();
    let score = (100.0 - issues as f64 / states.len() as f64 * 100.0).max(0.0);

    let direction = if score > THERMAL_STABLE_SCORE {
        Trend::Stable
    } else {
        Trend::Degrading
    };

    Some(TrendResult {
        metric_name: "Thermal Performance".to_string(),
        current_value: score,
        trend: direction,
        prediction: None,
        confidence: THERMAL_CONFIDENCE,
        recommendations: rules::thermal_advice(score),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    const UDID: &str = "00008030-test";

    fn analytics(dir: &TempDir) -> DeviceAnalytics {
        DeviceAnalytics::new(UDID, HistoryStore::new(dir.path()))
    }

    fn append_battery(analytics: &DeviceAnalytics, level: Option<f64>, cycles: Option<f64>) {
        let mut snap = MetricSnapshot::new(Utc::now());
        snap.insert_number("level", level);
        snap.insert_number("cycle_count", cycles);
        analytics
            .store
            .append(UDID, MetricFamily::Battery, snap)
            .unwrap();
    }

    fn append_thermal(analytics: &DeviceAnalytics, state: Option<&str>) {
        let mut snap = MetricSnapshot::new(Utc::now());
        snap.insert_text("thermal_state", state.map(str::to_string));
        analytics
            .store
            .append(UDID, MetricFamily::Performance, snap)
            .unwrap();
    }

    #[test]
    fn test_no_history_yields_empty_results() {
        let dir = TempDir::new().unwrap();
        let results = analytics(&dir).analyze_trends(30).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_battery_level_trend() {
        let dir = TempDir::new().unwrap();
        let analytics = analytics(&dir);

        for level in [80.0, 75.0, 70.0, 65.0] {
            append_battery(&analytics, Some(level), None);
        }

        let results = analytics.analyze_trends(30).unwrap();
        let result = &results["battery_level"];

        assert_eq!(result.trend, Trend::Degrading);
        assert_eq!(result.current_value, 65.0);
        assert_eq!(result.prediction, Some(60.0));
        assert_eq!(result.confidence, 0.7);
        assert!(!result.recommendations.is_empty());

        // Cycle counts were never present, so that metric is omitted
        assert!(!results.contains_key("battery_cycles"));
    }

    #[test]
    fn test_battery_cycles_trend_independent_of_level() {
        let dir = TempDir::new().unwrap();
        let analytics = analytics(&dir);

        // Levels absent on some snapshots, cycles always present
        append_battery(&analytics, None, Some(410.0));
        append_battery(&analytics, Some(90.0), Some(412.0));
        append_battery(&analytics, None, Some(415.0));

        let results = analytics.analyze_trends(30).unwrap();
        assert!(!results.contains_key("battery_level"));

        let cycles = &results["battery_cycles"];
        assert_eq!(cycles.current_value, 415.0);
        assert_eq!(cycles.confidence, 0.8);
        assert_eq!(cycles.trend, Trend::Improving);
    }

    #[test]
    fn test_storage_usage_trend() {
        let dir = TempDir::new().unwrap();
        let analytics = analytics(&dir);

        for usage in [70.0, 75.0, 80.0, 85.0, 90.0] {
            let mut snap = MetricSnapshot::new(Utc::now());
            snap.insert_number("usage_percent", Some(usage));
            analytics
                .store
                .append(UDID, MetricFamily::Storage, snap)
                .unwrap();
        }

        let results = analytics.analyze_trends(30).unwrap();
        let storage = &results["storage_usage"];

        assert_eq!(storage.trend, Trend::Improving);
        assert_eq!(storage.current_value, 90.0);
        assert_eq!(storage.prediction, Some(95.0));
        assert_eq!(storage.confidence, 0.9);
        // High absolute usage triggers cleanup advice regardless of direction
        assert!(!storage.recommendations.is_empty());
    }

    #[test]
    fn test_thermal_performance_all_normal() {
        let dir = TempDir::new().unwrap();
        let analytics = analytics(&dir);

        for _ in 0..4 {
            append_thermal(&analytics, Some("Normal"));
        }

        let results = analytics.analyze_trends(30).unwrap();
        let thermal = &results["thermal_performance"];

        assert_eq!(thermal.current_value, 100.0);
        assert_eq!(thermal.trend, Trend::Stable);
        assert_eq!(thermal.prediction, None);
        assert_eq!(thermal.confidence, 0.6);
        assert!(thermal.recommendations.is_empty());
    }

    #[test]
    fn test_thermal_performance_frequent_issues() {
        let dir = TempDir::new().unwrap();
        let analytics = analytics(&dir);

        append_thermal(&analytics, Some("Normal"));
        append_thermal(&analytics, Some("Serious"));
        append_thermal(&analytics, Some("Critical"));
        append_thermal(&analytics, Some("Serious"));

        let results = analytics.analyze_trends(30).unwrap();
        let thermal = &results["thermal_performance"];

        assert_eq!(thermal.current_value, 25.0);
        assert_eq!(thermal.trend, Trend::Degrading);
        assert!(!thermal.recommendations.is_empty());
    }

    #[test]
    fn test_thermal_performance_requires_three_readings() {
        let dir = TempDir::new().unwrap();
        let analytics = analytics(&dir);

        append_thermal(&analytics, Some("Normal"));
        append_thermal(&analytics, None);
        append_thermal(&analytics, Some("Normal"));

        // Two present readings among three snapshots is not enough
        let results = analytics.analyze_trends(30).unwrap();
        assert!(!results.contains_key("thermal_performance"));
    }
}
