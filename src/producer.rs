//! Metric snapshot producer
//!
//! Builds one timestamped snapshot per metric family from device
//! attribute queries. A field the device does not expose, or whose
//! value fails to parse, is recorded as absent; the snapshot itself is
//! always produced.

use crate::device::query_device_field;
use crate::error::DevitalsResult;
use crate::snapshot::{MetricFamily, MetricSnapshot};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Collect the current snapshot for one metric family
pub async fn produce_snapshot(
    udid: &str,
    family: MetricFamily,
) -> DevitalsResult<MetricSnapshot> {
    match family {
        MetricFamily::Battery => battery_snapshot(udid).await,
        MetricFamily::Storage => storage_snapshot(udid).await,
        MetricFamily::Performance => performance_snapshot(udid).await,
    }
}

async fn battery_snapshot(udid: &str) -> DevitalsResult<MetricSnapshot> {
    let mut snap = MetricSnapshot::now();
    snap.insert_number("level", query_number(udid, "BatteryCurrentCapacity").await?);
    snap.insert_number("cycle_count", query_number(udid, "BatteryCycleCount").await?);
    snap.insert_bool("is_charging", query_bool(udid, "BatteryIsCharging").await?);
    Ok(snap)
}

async fn storage_snapshot(udid: &str) -> DevitalsResult<MetricSnapshot> {
    let total_bytes = query_number(udid, "TotalDiskCapacity").await?;
    let available_bytes = query_number(udid, "AmountDataAvailable").await?;

    let (total_gb, used_gb, available_gb, usage_percent) = match (total_bytes, available_bytes) {
        (Some(total), Some(available)) if total > 0.0 => {
            let used = total - available;
            (
                Some(round2(total / BYTES_PER_GB)),
                Some(round2(used / BYTES_PER_GB)),
                Some(round2(available / BYTES_PER_GB)),
                Some(round2(used / total * 100.0)),
            )
        }
        _ => (None, None, None, None),
    };

    let mut snap = MetricSnapshot::now();
    snap.insert_number("total_gb", total_gb);
    snap.insert_number("used_gb", used_gb);
    snap.insert_number("available_gb", available_gb);
    snap.insert_number("usage_percent", usage_percent);
    Ok(snap)
}

async fn performance_snapshot(udid: &str) -> DevitalsResult<MetricSnapshot> {
    let memory_bytes = query_number(udid, "TotalSystemAvailable").await?;
    let thermal_state = query_device_field(udid, "ThermalState").await?;

    let mut snap = MetricSnapshot::now();
    snap.insert_number("total_memory_gb", memory_bytes.map(|b| round2(b / BYTES_PER_GB)));
    snap.insert_text("thermal_state", thermal_state);
    Ok(snap)
}

/// Query a field and parse it as a number; parse failure is absent
pub(crate) async fn query_number(udid: &str, key: &str) -> DevitalsResult<Option<f64>> {
    let Some(raw) = query_device_field(udid, key).await? else {
        return Ok(None);
    };

    match raw.parse::<f64>() {
        Ok(n) => Ok(Some(n)),
        Err(_) => {
            tracing::debug!(key, raw, "non-numeric value for numeric field");
            Ok(None)
        }
    }
}

/// Query a field and parse it as a boolean; parse failure is absent
pub(crate) async fn query_bool(udid: &str, key: &str) -> DevitalsResult<Option<bool>> {
    let Some(raw) = query_device_field(udid, key).await? else {
        return Ok(None);
    };

    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        _ => {
            tracing::debug!(key, raw, "non-boolean value for boolean field");
            Ok(None)
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(63.999999), 64.0);
        assert_eq!(round2(81.2345), 81.23);
        assert_eq!(round2(81.236), 81.24);
    }

    #[test]
    fn test_storage_derivation_math() {
        // 128 GB capacity, 32 GB free
        let total = 128.0 * BYTES_PER_GB;
        let available = 32.0 * BYTES_PER_GB;
        let used = total - available;

        assert_eq!(round2(total / BYTES_PER_GB), 128.0);
        assert_eq!(round2(used / BYTES_PER_GB), 96.0);
        assert_eq!(round2(used / total * 100.0), 75.0);
    }
}
