//! Metric snapshot data model
//!
//! A snapshot is one timestamped observation of a metric family's fields.
//! Fields are optional: a reading the device does not expose is stored as
//! an explicit absent value, which is distinct from zero or false and
//! survives serialization as JSON `null`.

use crate::error::DevitalsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single field reading within a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric reading (levels, counts, gigabytes, percentages)
    Number(f64),
    /// Boolean reading (charging state, feature toggles)
    Bool(bool),
    /// Textual reading (thermal state names, version strings)
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value, if it is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean view of the value, if it is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Textual view of the value, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Metric family: a named group of readings collected together
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFamily {
    /// Battery level, cycle count, charging state
    Battery,
    /// Disk capacity and usage
    Storage,
    /// Memory and thermal readings
    Performance,
}

impl MetricFamily {
    /// All families collected by the snapshot producer
    pub const ALL: [MetricFamily; 3] = [
        MetricFamily::Battery,
        MetricFamily::Storage,
        MetricFamily::Performance,
    ];

    /// Stable name, used as the history file stem
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFamily::Battery => "battery",
            MetricFamily::Storage => "storage",
            MetricFamily::Performance => "performance",
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricFamily {
    type Err = DevitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "battery" => Ok(MetricFamily::Battery),
            "storage" => Ok(MetricFamily::Storage),
            "performance" => Ok(MetricFamily::Performance),
            other => Err(DevitalsError::invalid_value(&format!(
                "unknown metric family: {other}"
            ))),
        }
    }
}

/// One observation of a metric family at one instant
///
/// Immutable once built; histories discard whole snapshots, never
/// individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Collection time (UTC, RFC 3339 on disk)
    pub timestamp: DateTime<Utc>,
    /// Field name to optional reading; `None` means unavailable
    #[serde(flatten)]
    pub fields: BTreeMap<String, Option<FieldValue>>,
}

impl MetricSnapshot {
    /// Create an empty snapshot stamped with the given time
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        MetricSnapshot {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Create an empty snapshot stamped with the current time
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Record a field, present or absent
    pub fn insert(&mut self, name: impl Into<String>, value: Option<FieldValue>) {
        self.fields.insert(name.into(), value);
    }

    /// Record a numeric field, absent when `value` is `None`
    pub fn insert_number(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.insert(name, value.map(FieldValue::Number));
    }

    /// Record a boolean field, absent when `value` is `None`
    pub fn insert_bool(&mut self, name: impl Into<String>, value: Option<bool>) {
        self.insert(name, value.map(FieldValue::Bool));
    }

    /// Record a text field, absent when `value` is `None`
    pub fn insert_text(&mut self, name: impl Into<String>, value: Option<String>) {
        self.insert(name, value.map(FieldValue::Text));
    }

    /// Present numeric value of a field; absent or non-numeric yields `None`
    pub fn number(&self, name: &str) -> Option<f64> {
        self.fields.get(name)?.as_ref()?.as_number()
    }

    /// Present boolean value of a field
    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.fields.get(name)?.as_ref()?.as_bool()
    }

    /// Present text value of a field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.as_ref()?.as_text()
    }

    /// Whether the field was recorded with a present value
    pub fn is_present(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_snapshot() -> MetricSnapshot {
        let mut snap = MetricSnapshot::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
        snap.insert_number("level", Some(80.0));
        snap.insert_number("cycle_count", None);
        snap.insert_bool("is_charging", Some(false));
        snap.insert_text("thermal_state", Some("Normal".to_string()));
        snap
    }

    #[test]
    fn test_field_accessors() {
        let snap = sample_snapshot();

        assert_eq!(snap.number("level"), Some(80.0));
        assert_eq!(snap.boolean("is_charging"), Some(false));
        assert_eq!(snap.text("thermal_state"), Some("Normal"));

        // Absent is neither zero nor false
        assert_eq!(snap.number("cycle_count"), None);
        assert!(!snap.is_present("cycle_count"));
        assert!(snap.is_present("level"));

        // Cross-typed access yields None rather than coercing
        assert_eq!(snap.number("thermal_state"), None);
        assert_eq!(snap.boolean("level"), None);
    }

    #[test]
    fn test_json_round_trip_preserves_absence() {
        let snap = sample_snapshot();

        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"cycle_count\":null"));

        let back: MetricSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
        assert!(!back.is_present("cycle_count"));
        assert_eq!(back.number("level"), Some(80.0));
        assert_eq!(back.boolean("is_charging"), Some(false));
    }

    #[test]
    fn test_untagged_field_value_decoding() {
        let v: FieldValue = serde_json::from_str("42.5").unwrap();
        assert_eq!(v, FieldValue::Number(42.5));

        let v: FieldValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, FieldValue::Bool(true));

        let v: FieldValue = serde_json::from_str("\"Serious\"").unwrap();
        assert_eq!(v, FieldValue::Text("Serious".to_string()));
    }

    #[test]
    fn test_metric_family_names() {
        for family in MetricFamily::ALL {
            let parsed: MetricFamily = family.as_str().parse().unwrap();
            assert_eq!(parsed, family);
        }

        assert!("thermal".parse::<MetricFamily>().is_err());
        assert_eq!(MetricFamily::Battery.to_string(), "battery");
    }

    #[test]
    fn test_family_serde_names_match_file_stems() {
        let json = serde_json::to_string(&MetricFamily::Performance).unwrap();
        assert_eq!(json, "\"performance\"");
    }
}
