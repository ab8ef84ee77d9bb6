//! Static recommendation rules
//!
//! Decision tables mapping a metric's (trend, current value) to advice
//! strings. The tables are fixed text; the analyzer never generates
//! advice on its own.

use crate::trend::Trend;

/// Battery cycle count above which replacement is suggested
pub const CYCLE_REPLACEMENT_THRESHOLD: f64 = 500.0;
/// Battery cycle count above which replacement is strongly recommended
pub const CYCLE_CRITICAL_THRESHOLD: f64 = 1000.0;

/// Advice for the battery level trend
pub fn battery_level_advice(trend: Trend, current_level: f64) -> Vec<String> {
    let mut recommendations = Vec::new();

    if trend == Trend::Degrading {
        recommendations.extend([
            "Battery performance declining - monitor closely".to_string(),
            "Consider enabling Low Power Mode more frequently".to_string(),
            "Reduce screen brightness and background app refresh".to_string(),
        ]);
    }

    if current_level < 20.0 {
        recommendations.push("Charge device soon to avoid shutdown".to_string());
    }

    recommendations
}

/// Advice for the battery cycle count trend
///
/// Cycle counts only ever grow; the advice keys off the absolute count
/// rather than the direction.
pub fn battery_cycle_advice(_trend: Trend, cycle_count: f64) -> Vec<String> {
    let mut recommendations = Vec::new();

    if cycle_count > CYCLE_REPLACEMENT_THRESHOLD {
        recommendations.extend([
            "Battery cycle count is high - consider replacement".to_string(),
            "Enable Optimized Battery Charging".to_string(),
            "Avoid frequent full charge/discharge cycles".to_string(),
        ]);
    }

    if cycle_count > CYCLE_CRITICAL_THRESHOLD {
        recommendations.push("Battery replacement strongly recommended".to_string());
    }

    recommendations
}

/// Advice for the storage usage trend
pub fn storage_usage_advice(trend: Trend, current_usage: f64) -> Vec<String> {
    let mut recommendations = Vec::new();

    if trend == Trend::Degrading || current_usage > 85.0 {
        recommendations.extend([
            "Storage usage increasing rapidly".to_string(),
            "Delete unused apps and files".to_string(),
            "Enable Optimize iPhone Storage for Photos".to_string(),
            "Review and delete large attachments".to_string(),
        ]);
    }

    if current_usage > 95.0 {
        recommendations.push("Critical storage level - immediate cleanup needed".to_string());
    }

    recommendations
}

/// Advice for the derived thermal performance score
pub fn thermal_advice(thermal_score: f64) -> Vec<String> {
    let mut recommendations = Vec::new();

    if thermal_score < 70.0 {
        recommendations.extend([
            "Device overheating frequently".to_string(),
            "Avoid intensive tasks while charging".to_string(),
            "Remove case during heavy usage".to_string(),
            "Keep device out of direct sunlight".to_string(),
        ]);
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_level_advice_degrading() {
        let advice = battery_level_advice(Trend::Degrading, 50.0);
        assert_eq!(advice.len(), 3);
        assert!(advice[0].contains("declining"));
    }

    #[test]
    fn test_battery_level_advice_low_charge() {
        let advice = battery_level_advice(Trend::Stable, 15.0);
        assert_eq!(advice.len(), 1);
        assert!(advice[0].contains("Charge device soon"));

        // Degrading and low stacks both tables
        let advice = battery_level_advice(Trend::Degrading, 15.0);
        assert_eq!(advice.len(), 4);
    }

    #[test]
    fn test_battery_level_advice_healthy_is_empty() {
        assert!(battery_level_advice(Trend::Improving, 90.0).is_empty());
        assert!(battery_level_advice(Trend::Stable, 50.0).is_empty());
    }

    #[test]
    fn test_battery_cycle_advice_thresholds() {
        assert!(battery_cycle_advice(Trend::Stable, 300.0).is_empty());

        let advice = battery_cycle_advice(Trend::Stable, 600.0);
        assert_eq!(advice.len(), 3);

        let advice = battery_cycle_advice(Trend::Improving, 1200.0);
        assert_eq!(advice.len(), 4);
        assert!(advice[3].contains("strongly recommended"));
    }

    #[test]
    fn test_storage_usage_advice() {
        assert!(storage_usage_advice(Trend::Stable, 50.0).is_empty());

        // High usage alone triggers cleanup advice
        let advice = storage_usage_advice(Trend::Stable, 90.0);
        assert_eq!(advice.len(), 4);

        // Degrading trend triggers it at any level
        let advice = storage_usage_advice(Trend::Degrading, 40.0);
        assert_eq!(advice.len(), 4);

        let advice = storage_usage_advice(Trend::Degrading, 97.0);
        assert_eq!(advice.len(), 5);
        assert!(advice[4].contains("Critical"));
    }

    #[test]
    fn test_thermal_advice() {
        assert!(thermal_advice(85.0).is_empty());
        assert_eq!(thermal_advice(60.0).len(), 4);
    }
}
