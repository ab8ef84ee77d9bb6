//! Report rendering
//!
//! Turns diagnostic reports and trend results into text for the
//! console and markdown for saved reports. Absent readings render as
//! "N/A"; an empty trend set renders a hint to collect more data, not
//! an error.

use crate::device::DeviceInfo;
use crate::diag::DiagnosticReport;
use crate::snapshot::FieldValue;
use crate::trend::TrendResult;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Line shown when no metric has enough history yet
pub const INSUFFICIENT_DATA_HINT: &str =
    "Insufficient data for trend analysis. Use the device for a few days and retry.";

/// Display form of an optional reading
pub fn display_value(value: &Option<FieldValue>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "N/A".to_string(),
    }
}

/// Human-readable label from a snake_case field name
fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Console rendering of a single diagnostic report
pub fn render_diagnostic_text(report: &DiagnosticReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} results:", title_case(report.kind.as_str()));

    if let Some(status) = &report.status {
        let _ = writeln!(out, "  Status: {status}");
    }
    for (name, value) in &report.values {
        let _ = writeln!(out, "  {}: {}", title_case(name), display_value(value));
    }
    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "  Recommendations:");
        for rec in &report.recommendations {
            let _ = writeln!(out, "    - {rec}");
        }
    }

    out
}

/// Console rendering of trend results
pub fn render_trends_text(trends: &BTreeMap<String, TrendResult>) -> String {
    if trends.is_empty() {
        return format!("{INSUFFICIENT_DATA_HINT}\n");
    }

    let mut out = String::from("Trend analysis:\n");
    for result in trends.values() {
        let prediction = result
            .prediction
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "  {}: current {}, {} (prediction {}, confidence {:.0}%)",
            result.metric_name,
            result.current_value,
            result.trend,
            prediction,
            result.confidence * 100.0,
        );
        for rec in &result.recommendations {
            let _ = writeln!(out, "    - {rec}");
        }
    }

    out
}

/// Markdown report covering identity, diagnostics, and trends
pub fn render_markdown_report(
    device: &DeviceInfo,
    diagnostics: &[DiagnosticReport],
    trends: &BTreeMap<String, TrendResult>,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Device Diagnostic Report");
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out);
    let _ = writeln!(out, "## Device Information");
    let _ = writeln!(out, "- Name: {}", device.name);
    let _ = writeln!(out, "- Model: {}", device.model);
    let _ = writeln!(out, "- iOS Version: {}", device.version);
    let _ = writeln!(out, "- Serial: {}", device.serial);
    let _ = writeln!(out, "- UDID: {}", device.udid);

    let _ = writeln!(out);
    let _ = writeln!(out, "## Diagnostic Results");
    for report in diagnostics {
        let _ = writeln!(out);
        let _ = writeln!(out, "### {} Analysis", title_case(report.kind.as_str()));
        if let Some(status) = &report.status {
            let _ = writeln!(out, "- Status: {status}");
        }
        for (name, value) in &report.values {
            let _ = writeln!(out, "- {}: {}", title_case(name), display_value(value));
        }
        if !report.recommendations.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "**Recommendations:**");
            for rec in &report.recommendations {
                let _ = writeln!(out, "- {rec}");
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Trend Analysis");
    if trends.is_empty() {
        let _ = writeln!(out, "{INSUFFICIENT_DATA_HINT}");
        return out;
    }

    for result in trends.values() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### {}", result.metric_name);
        let _ = writeln!(out, "- Current Value: {}", result.current_value);
        let _ = writeln!(out, "- Trend: {}", result.trend);
        let _ = writeln!(
            out,
            "- Prediction: {}",
            result
                .prediction
                .map(|p| p.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        );
        let _ = writeln!(out, "- Confidence: {:.0}%", result.confidence * 100.0);
        if !result.recommendations.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "**Recommendations:**");
            for rec in &result.recommendations {
                let _ = writeln!(out, "- {rec}");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::Trend;
    use pretty_assertions::assert_eq;

    fn test_device() -> DeviceInfo {
        DeviceInfo {
            name: "Field iPhone".to_string(),
            model: "iPhone14,2".to_string(),
            version: "17.5.1".to_string(),
            udid: "00008030-test".to_string(),
            serial: "F2LXK3JQ0D".to_string(),
        }
    }

    fn test_trend() -> TrendResult {
        TrendResult {
            metric_name: "Battery Level".to_string(),
            current_value: 65.0,
            trend: Trend::Degrading,
            prediction: Some(60.0),
            confidence: 0.7,
            recommendations: vec!["Battery performance declining - monitor closely".to_string()],
        }
    }

    #[test]
    fn test_display_value_absent_is_na() {
        assert_eq!(display_value(&None), "N/A");
        assert_eq!(display_value(&Some(FieldValue::Number(81.23))), "81.23");
        assert_eq!(display_value(&Some(FieldValue::Bool(false))), "false");
        assert_eq!(
            display_value(&Some(FieldValue::Text("Normal".to_string()))),
            "Normal"
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("battery_level"), "Battery Level");
        assert_eq!(title_case("usage_percent"), "Usage Percent");
        assert_eq!(title_case("apps"), "Apps");
    }

    #[test]
    fn test_render_diagnostic_text() {
        let mut values = BTreeMap::new();
        values.insert("battery_level".to_string(), Some(FieldValue::Number(81.0)));
        values.insert("cycle_count".to_string(), None);
        let report = DiagnosticReport {
            kind: crate::diag::DiagnosticKind::Battery,
            values,
            status: Some("Good".to_string()),
            recommendations: vec!["Charge device immediately".to_string()],
        };

        let text = render_diagnostic_text(&report);
        assert!(text.starts_with("Battery results:"));
        assert!(text.contains("Status: Good"));
        assert!(text.contains("Battery Level: 81"));
        assert!(text.contains("Cycle Count: N/A"));
        assert!(text.contains("- Charge device immediately"));
    }

    #[test]
    fn test_render_trends_text_empty_hints_at_collection() {
        let trends = BTreeMap::new();
        let text = render_trends_text(&trends);
        assert!(text.contains("Insufficient data"));
        assert!(text.contains("few days"));
    }

    #[test]
    fn test_render_trends_text_includes_prediction_and_confidence() {
        let mut trends = BTreeMap::new();
        trends.insert("battery_level".to_string(), test_trend());

        let text = render_trends_text(&trends);
        assert!(text.contains("Battery Level"));
        assert!(text.contains("degrading"));
        assert!(text.contains("prediction 60"));
        assert!(text.contains("confidence 70%"));
        assert!(text.contains("monitor closely"));
    }

    #[test]
    fn test_render_trends_text_absent_prediction_is_na() {
        let mut trend = test_trend();
        trend.prediction = None;
        let mut trends = BTreeMap::new();
        trends.insert("thermal_performance".to_string(), trend);

        let text = render_trends_text(&trends);
        assert!(text.contains("prediction N/A"));
    }

    #[test]
    fn test_markdown_report_sections() {
        let device = test_device();
        let mut trends = BTreeMap::new();
        trends.insert("battery_level".to_string(), test_trend());

        let report = render_markdown_report(&device, &[], &trends, Utc::now());

        assert!(report.starts_with("# Device Diagnostic Report"));
        assert!(report.contains("## Device Information"));
        assert!(report.contains("- Name: Field iPhone"));
        assert!(report.contains("- UDID: 00008030-test"));
        assert!(report.contains("### Battery Level"));
        assert!(report.contains("- Trend: degrading"));
        assert!(report.contains("- Prediction: 60"));
        assert!(report.contains("- Confidence: 70%"));
    }

    #[test]
    fn test_markdown_report_without_trends_hints_at_collection() {
        let device = test_device();
        let report = render_markdown_report(&device, &[], &BTreeMap::new(), Utc::now());
        assert!(report.contains(INSUFFICIENT_DATA_HINT));
    }
}
