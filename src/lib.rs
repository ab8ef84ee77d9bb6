//! # devitals - iOS Device Diagnostics & Trend Analytics
//!
//! devitals inspects iOS devices through the libimobiledevice
//! command-line tools, runs per-area diagnostic routines, and keeps a
//! bounded on-disk history of key metrics so it can report whether a
//! device is improving, stable, or degrading over time.
//!
//! ## Quick Start
//!
//! ### Collect and analyze
//!
//! ```no_run
//! use devitals::DeviceAnalytics;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analytics = DeviceAnalytics::open("00008030-001E4C")?;
//!
//!     // Append today's snapshots, then look at the last 30 days
//!     analytics.collect_snapshots().await?;
//!     for (key, result) in analytics.analyze_trends(30)? {
//!         println!(
//!             "{key}: {} ({}, prediction {:?})",
//!             result.current_value, result.trend, result.prediction
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Run a diagnostic
//!
//! ```no_run
//! use devitals::{diag, resolve_device};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = resolve_device(None).await?;
//!     let report = diag::run(diag::DiagnosticKind::Battery, &device).await?;
//!     println!("status: {:?}", report.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The processing pipeline has three stages:
//!
//! 1. **Collection**: each metric family (battery, storage,
//!    performance) is read from the device as one timestamped snapshot;
//!    unavailable readings stay absent rather than defaulting to zero.
//! 2. **History**: snapshots append to a bounded per-device JSON log
//!    (newest 1000 kept) under `~/.devitals/analytics`.
//! 3. **Analysis**: a least-squares fit over a trailing window
//!    classifies each metric's direction and projects its next value.
//!
//! Diagnostics, report rendering, and the optional advice client sit
//! beside the pipeline and consume its outputs.
//!
//! ## Error Handling
//!
//! Fallible operations return [`DevitalsResult`]. Missing data is not
//! an error: a field the device does not expose is an absent value,
//! and a metric without enough history is simply omitted from results.
//! Hard errors are reserved for missing tools and storage failures.

pub mod advice;
pub mod analytics;
pub mod device;
pub mod diag;
pub mod error;
pub mod history;
pub mod producer;
pub mod report;
pub mod rules;
pub mod snapshot;
pub mod toolchain;
pub mod trend;

pub use advice::{AdviceClient, AdviceConfig};
pub use analytics::DeviceAnalytics;
pub use device::{DeviceInfo, list_devices, query_device_field, resolve_device};
pub use error::{DevitalsError, DevitalsResult};
pub use history::{HISTORY_CAP, HistoryStore};
pub use snapshot::{FieldValue, MetricFamily, MetricSnapshot};
pub use trend::{Trend, TrendResult};

use std::collections::BTreeMap;

/// Collect one snapshot per metric family for a device and append each
/// to its history (convenience function)
pub async fn collect_device_snapshots(
    udid: &str,
) -> DevitalsResult<BTreeMap<MetricFamily, MetricSnapshot>> {
    DeviceAnalytics::open(udid)?.collect_snapshots().await
}

/// Analyze metric trends for a device over a trailing window of days
/// (convenience function)
///
/// Metrics with fewer than three recorded values in the window are
/// omitted; an empty map means no metric has enough history yet.
pub fn analyze_device_trends(
    udid: &str,
    days: i64,
) -> DevitalsResult<BTreeMap<String, TrendResult>> {
    DeviceAnalytics::open(udid)?.analyze_trends(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<DeviceInfo>();
        assert_send_sync::<MetricSnapshot>();
        assert_send_sync::<HistoryStore>();
        assert_send_sync::<TrendResult>();
        assert_send_sync::<DeviceAnalytics>();
    }

    #[test]
    fn test_history_cap_re_export() {
        assert_eq!(HISTORY_CAP, 1000);
    }
}
