//! Device diagnostic routines
//!
//! One straight-line routine per diagnostic area: query a handful of
//! device attributes, derive a status, attach static recommendations.
//! Routine selection is a plain enum dispatch. Individual readings that
//! fail degrade to absent values; only a missing toolchain aborts a
//! routine.

use crate::device::{DeviceInfo, query_device_field, run_tool};
use crate::error::{DevitalsError, DevitalsResult};
use crate::producer::{query_bool, query_number, round2};
use crate::snapshot::FieldValue;
use crate::toolchain::IDEVICEINSTALLER;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Diagnostic areas, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Battery,
    Storage,
    Network,
    Security,
    Performance,
    Thermal,
    Backup,
    Accessibility,
    Apps,
    Crashes,
}

impl DiagnosticKind {
    /// Every diagnostic, in the order reports present them
    pub const ALL: [DiagnosticKind; 10] = [
        DiagnosticKind::Battery,
        DiagnosticKind::Storage,
        DiagnosticKind::Network,
        DiagnosticKind::Security,
        DiagnosticKind::Performance,
        DiagnosticKind::Thermal,
        DiagnosticKind::Backup,
        DiagnosticKind::Accessibility,
        DiagnosticKind::Apps,
        DiagnosticKind::Crashes,
    ];

    /// Stable name used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Battery => "battery",
            DiagnosticKind::Storage => "storage",
            DiagnosticKind::Network => "network",
            DiagnosticKind::Security => "security",
            DiagnosticKind::Performance => "performance",
            DiagnosticKind::Thermal => "thermal",
            DiagnosticKind::Backup => "backup",
            DiagnosticKind::Accessibility => "accessibility",
            DiagnosticKind::Apps => "apps",
            DiagnosticKind::Crashes => "crashes",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagnosticKind {
    type Err = DevitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagnosticKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                DevitalsError::invalid_value(&format!("unknown diagnostic module: {s}"))
            })
    }
}

/// Outcome of one diagnostic routine
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    /// Which routine produced this report
    pub kind: DiagnosticKind,
    /// Readings by name; `None` means the device did not expose it
    pub values: BTreeMap<String, Option<FieldValue>>,
    /// Derived status label, when the routine defines one
    pub status: Option<String>,
    /// Static advice derived from the readings
    pub recommendations: Vec<String>,
}

impl DiagnosticReport {
    fn new(kind: DiagnosticKind) -> Self {
        DiagnosticReport {
            kind,
            values: BTreeMap::new(),
            status: None,
            recommendations: Vec::new(),
        }
    }

    fn set_number(&mut self, name: &str, value: Option<f64>) {
        self.values
            .insert(name.to_string(), value.map(FieldValue::Number));
    }

    fn set_bool(&mut self, name: &str, value: Option<bool>) {
        self.values
            .insert(name.to_string(), value.map(FieldValue::Bool));
    }

    fn set_text(&mut self, name: &str, value: Option<String>) {
        self.values
            .insert(name.to_string(), value.map(FieldValue::Text));
    }
}

/// Run one diagnostic routine against a device
pub async fn run(kind: DiagnosticKind, device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    match kind {
        DiagnosticKind::Battery => battery(device).await,
        DiagnosticKind::Storage => storage(device).await,
        DiagnosticKind::Network => network(device).await,
        DiagnosticKind::Security => security(device).await,
        DiagnosticKind::Performance => performance(device).await,
        DiagnosticKind::Thermal => thermal(device).await,
        DiagnosticKind::Backup => backup(device).await,
        DiagnosticKind::Accessibility => accessibility(device).await,
        DiagnosticKind::Apps => apps(device).await,
        DiagnosticKind::Crashes => crashes(device).await,
    }
}

/// Run every diagnostic routine, in report order
pub async fn run_all(device: &DeviceInfo) -> DevitalsResult<Vec<DiagnosticReport>> {
    let mut reports = Vec::with_capacity(DiagnosticKind::ALL.len());
    for kind in DiagnosticKind::ALL {
        tracing::debug!(%kind, udid = %device.udid, "running diagnostic");
        reports.push(run(kind, device).await?);
    }
    Ok(reports)
}

async fn battery(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let level = query_number(&device.udid, "BatteryCurrentCapacity").await?;
    let cycles = query_number(&device.udid, "BatteryCycleCount").await?;

    let mut report = DiagnosticReport::new(DiagnosticKind::Battery);
    report.set_number("battery_level", level);
    report.set_number("cycle_count", cycles);
    report.status = Some(battery_health(cycles).to_string());

    if let Some(level) = level {
        if level < 20.0 {
            report
                .recommendations
                .push("Charge device immediately".to_string());
        }
    }
    if let Some(cycles) = cycles {
        if cycles > 500.0 {
            report.recommendations.extend([
                "Consider battery replacement".to_string(),
                "Enable optimized battery charging".to_string(),
            ]);
        }
        if cycles > 1000.0 {
            report
                .recommendations
                .push("Battery replacement strongly recommended".to_string());
        }
    }

    Ok(report)
}

async fn storage(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let total = query_number(&device.udid, "TotalDiskCapacity").await?;
    let available = query_number(&device.udid, "AmountDataAvailable").await?;

    let mut report = DiagnosticReport::new(DiagnosticKind::Storage);

    if let (Some(total), Some(available)) = (total, available) {
        if total > 0.0 {
            let used = total - available;
            let usage_percent = round2(used / total * 100.0);
            report.set_number("total_storage_gb", Some(round2(total / BYTES_PER_GB)));
            report.set_number("used_storage_gb", Some(round2(used / BYTES_PER_GB)));
            report.set_number("free_storage_gb", Some(round2(available / BYTES_PER_GB)));
            report.set_number("usage_percent", Some(usage_percent));
            report.status = Some(storage_status(usage_percent).to_string());
            report.recommendations = storage_recommendations(usage_percent);
            return Ok(report);
        }
    }

    report.set_number("total_storage_gb", None);
    report.set_number("used_storage_gb", None);
    report.set_number("free_storage_gb", None);
    report.set_number("usage_percent", None);
    Ok(report)
}

async fn network(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let wifi_address = query_device_field(&device.udid, "WiFiAddress").await?;
    let carrier = query_device_field(&device.udid, "CarrierSettingsVersion").await?;

    let wifi_connected = wifi_address.is_some();
    let has_cellular = carrier.is_some();

    let mut report = DiagnosticReport::new(DiagnosticKind::Network);
    report.set_bool("wifi_connected", Some(wifi_connected));
    report.set_text("wifi_address", wifi_address);
    report.set_bool("has_cellular", Some(has_cellular));
    report.status = Some(
        if wifi_connected || has_cellular {
            "Connected"
        } else {
            "Disconnected"
        }
        .to_string(),
    );

    if !wifi_connected && !has_cellular {
        report.recommendations.extend([
            "Check WiFi settings".to_string(),
            "Verify cellular data is enabled".to_string(),
            "Reset network settings if issues persist".to_string(),
        ]);
    } else if !wifi_connected {
        report
            .recommendations
            .push("Connect to WiFi to save cellular data".to_string());
    }

    Ok(report)
}

async fn security(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let passcode = query_bool(&device.udid, "PasswordProtected").await?;
    let activation = query_device_field(&device.udid, "ActivationState").await?;
    let supervised = query_bool(&device.udid, "IsSupervised").await?;

    let score = security_score(passcode, activation.as_deref(), supervised);

    let mut report = DiagnosticReport::new(DiagnosticKind::Security);
    report.set_bool("passcode_enabled", passcode);
    report.set_text("activation_state", activation.clone());
    report.set_bool("is_supervised", supervised);
    report.set_number("security_score", Some(score as f64));
    report.status = Some(security_level(score).to_string());

    if passcode != Some(true) {
        report
            .recommendations
            .push("Enable device passcode for security".to_string());
    }
    if activation.as_deref() != Some("Activated") {
        report
            .recommendations
            .push("Ensure device is properly activated".to_string());
    }
    report.recommendations.extend([
        "Enable two-factor authentication for Apple ID".to_string(),
        "Keep iOS updated to latest version".to_string(),
        "Review app permissions regularly".to_string(),
    ]);

    Ok(report)
}

async fn performance(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let hardware = query_device_field(&device.udid, "HardwareModel").await?;
    let cpu_arch = query_device_field(&device.udid, "CPUArchitecture").await?;
    let memory = query_number(&device.udid, "TotalSystemAvailable").await?;

    let rating = performance_rating(&device.model, memory);
    let mut report = DiagnosticReport::new(DiagnosticKind::Performance);
    report.set_text("hardware_model", hardware);
    report.set_text("cpu_architecture", cpu_arch);
    report.set_number("total_memory_gb", memory.map(|b| round2(b / BYTES_PER_GB)));
    report.status = Some(rating.to_string());

    if let Some(bytes) = memory {
        if bytes < 2.0 * BYTES_PER_GB {
            report
                .recommendations
                .push("Low RAM may cause app crashes".to_string());
        }
        if bytes < 3.0 * BYTES_PER_GB {
            report
                .recommendations
                .push("Limit number of open apps".to_string());
        }
    }
    if rating == "Low" {
        report.recommendations.extend([
            "Close background apps regularly".to_string(),
            "Reduce visual effects".to_string(),
            "Disable background app refresh for unused apps".to_string(),
        ]);
    }
    report.recommendations.extend([
        "Restart device weekly".to_string(),
        "Keep iOS updated".to_string(),
    ]);

    Ok(report)
}

async fn thermal(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let state = query_device_field(&device.udid, "ThermalState").await?;

    let temp = estimate_temperature(state.as_deref());
    let mut report = DiagnosticReport::new(DiagnosticKind::Thermal);
    report.set_text("thermal_state", state.clone());
    report.set_number("estimated_temp_celsius", Some(temp));
    report.status = Some(temperature_status(temp).to_string());

    let serious = matches!(state.as_deref(), Some("Serious") | Some("Critical"));
    if serious || temp > 45.0 {
        report.recommendations.extend([
            "Remove device from direct sunlight".to_string(),
            "Close demanding applications".to_string(),
            "Remove device case temporarily".to_string(),
            "Allow device to cool down".to_string(),
        ]);
    }
    if temp > 50.0 {
        report
            .recommendations
            .push("Turn off device until it cools down".to_string());
    }
    report.recommendations.extend([
        "Avoid charging while using intensive apps".to_string(),
        "Use official chargers only".to_string(),
    ]);

    Ok(report)
}

async fn backup(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let last_backup = query_device_field(&device.udid, "LastBackupDate").await?;
    let encrypted = query_bool(&device.udid, "WillEncrypt").await?;

    let status = backup_status(last_backup.as_deref());
    let mut report = DiagnosticReport::new(DiagnosticKind::Backup);
    report.set_text("last_backup_date", last_backup);
    report.set_bool("backup_encrypted", encrypted);
    report.status = Some(status.to_string());

    if status == "Never" {
        report.recommendations.extend([
            "Create regular backups".to_string(),
            "Enable iCloud backup or local backup".to_string(),
        ]);
    }
    if encrypted != Some(true) {
        report
            .recommendations
            .push("Enable encrypted backups for complete data protection".to_string());
    }
    report.recommendations.extend([
        "Verify backup integrity regularly".to_string(),
        "Store backups in multiple locations".to_string(),
    ]);

    Ok(report)
}

async fn accessibility(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let voiceover = query_bool(&device.udid, "VoiceOverTouchEnabled").await?;
    let zoom = query_bool(&device.udid, "ZoomTouchEnabled").await?;

    let voiceover_on = voiceover.unwrap_or(false);
    let zoom_on = zoom.unwrap_or(false);
    let score = accessibility_score(voiceover_on, zoom_on);

    let mut report = DiagnosticReport::new(DiagnosticKind::Accessibility);
    report.set_bool("voiceover_enabled", Some(voiceover_on));
    report.set_bool("zoom_enabled", Some(zoom_on));
    report.set_number("accessibility_score", Some(score as f64));

    report.recommendations.extend([
        "Review accessibility settings in Settings > Accessibility".to_string(),
        "Enable shortcuts for frequently used features".to_string(),
    ]);
    if !voiceover_on && !zoom_on {
        report
            .recommendations
            .push("Consider enabling accessibility features if needed".to_string());
    }

    Ok(report)
}

async fn apps(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let listing = run_tool(IDEVICEINSTALLER, &["-u", &device.udid, "-l"]).await?;

    let mut report = DiagnosticReport::new(DiagnosticKind::Apps);
    let Some(listing) = listing else {
        report.set_number("total_apps", None);
        return Ok(report);
    };

    let apps = parse_app_listing(&listing);
    report.set_number("total_apps", Some(apps.len() as f64));
    // Only the leading entries are itemized, to keep reports readable
    for (bundle_id, name) in apps.iter().take(20) {
        report.set_text(bundle_id, Some(name.clone()));
    }

    if apps.len() > 100 {
        report
            .recommendations
            .push("Consider removing unused apps to free storage".to_string());
    }

    Ok(report)
}

async fn crashes(device: &DeviceInfo) -> DevitalsResult<DiagnosticReport> {
    let mut report = DiagnosticReport::new(DiagnosticKind::Crashes);

    let Some(logs_dir) = crash_log_dir(&device.name) else {
        report.set_number("total_crashes", None);
        return Ok(report);
    };

    let entries = match std::fs::read_dir(&logs_dir) {
        Ok(entries) => entries,
        Err(_) => {
            report.set_number("total_crashes", None);
            return Ok(report);
        }
    };

    let mut crash_files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("crash"))
        .collect();
    crash_files.sort();

    // Only the most recent reports matter for advice
    let recent: Vec<PathBuf> = crash_files.into_iter().rev().take(10).collect();

    let mut per_app: BTreeMap<String, usize> = BTreeMap::new();
    for path in &recent {
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        let app = extract_crashed_process(&content);
        let reason = extract_crash_reason(&content);
        *per_app.entry(app.clone()).or_insert(0) += 1;

        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            report.set_text(file_name, Some(format!("{app}: {reason}")));
        }
    }

    report.set_number("total_crashes", Some(recent.len() as f64));

    if recent.len() > 5 {
        report
            .recommendations
            .push("Multiple crashes detected - consider device restart".to_string());
    }
    for (app, count) in &per_app {
        if *count > 2 {
            report.recommendations.push(format!(
                "App '{app}' crashing frequently - consider update/reinstall"
            ));
        }
    }

    Ok(report)
}

// Derivation helpers, pure so the tables are testable without a device

fn battery_health(cycles: Option<f64>) -> &'static str {
    match cycles {
        Some(c) if c < 500.0 => "Good",
        _ => "Degraded",
    }
}

fn storage_status(usage_percent: f64) -> &'static str {
    if usage_percent < 70.0 {
        "Healthy"
    } else if usage_percent < 85.0 {
        "Moderate"
    } else {
        "Critical"
    }
}

fn storage_recommendations(usage_percent: f64) -> Vec<String> {
    if usage_percent > 85.0 {
        vec![
            "Delete unused apps".to_string(),
            "Clear cache and temporary files".to_string(),
            "Remove old photos/videos".to_string(),
            "Offload unused apps".to_string(),
        ]
    } else if usage_percent > 70.0 {
        vec![
            "Review and delete large files".to_string(),
            "Enable optimize storage".to_string(),
        ]
    } else {
        Vec::new()
    }
}

fn security_score(passcode: Option<bool>, activation: Option<&str>, supervised: Option<bool>) -> u32 {
    let mut score = 0;
    if passcode == Some(true) {
        score += 40;
    }
    if activation == Some("Activated") {
        score += 30;
    }
    if supervised == Some(true) {
        score += 30;
    }
    score
}

fn security_level(score: u32) -> &'static str {
    if score >= 80 {
        "High"
    } else if score >= 50 {
        "Medium"
    } else {
        "Low"
    }
}

fn performance_rating(model: &str, memory_bytes: Option<f64>) -> &'static str {
    let low_memory = memory_bytes.is_some_and(|b| b < 2.0 * BYTES_PER_GB);
    if model.starts_with("iPhone1,") || low_memory {
        return "Low";
    }
    // Recent generations report ProductType numbers of 14 and up
    let generation = model
        .strip_prefix("iPhone")
        .and_then(|rest| rest.split(',').next())
        .and_then(|n| n.parse::<u32>().ok());
    match generation {
        Some(g) if g >= 14 => "High",
        _ => "Medium",
    }
}

fn estimate_temperature(thermal_state: Option<&str>) -> f64 {
    match thermal_state {
        Some("Normal") => 35.0,
        Some("Fair") => 42.0,
        Some("Serious") => 48.0,
        Some("Critical") => 55.0,
        _ => 40.0,
    }
}

fn temperature_status(temp: f64) -> &'static str {
    if temp < 40.0 {
        "Normal"
    } else if temp < 45.0 {
        "Warm"
    } else if temp < 50.0 {
        "Hot"
    } else {
        "Overheating"
    }
}

fn backup_status(last_backup: Option<&str>) -> &'static str {
    match last_backup {
        None | Some("(null)") => "Never",
        Some(_) => "Recorded",
    }
}

fn accessibility_score(voiceover: bool, zoom: bool) -> u32 {
    let mut score = 50;
    if voiceover {
        score += 25;
    }
    if zoom {
        score += 25;
    }
    score
}

fn parse_app_listing(listing: &str) -> Vec<(String, String)> {
    listing
        .lines()
        .filter_map(|line| line.split_once(" - "))
        .map(|(bundle_id, name)| (bundle_id.trim().to_string(), name.trim().to_string()))
        .collect()
}

fn crash_log_dir(device_name: &str) -> Option<PathBuf> {
    Some(
        dirs::home_dir()?
            .join("Library/Logs/CrashReporter/MobileDevice")
            .join(device_name),
    )
}

fn extract_crashed_process(content: &str) -> String {
    for line in content.lines().take(10) {
        if let Some(rest) = line.strip_prefix("Process:") {
            if let Some(name) = rest.trim().split_whitespace().next() {
                return name.to_string();
            }
        }
    }
    "Unknown".to_string()
}

fn extract_crash_reason(content: &str) -> String {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("Exception Type:") {
            return rest.trim().to_string();
        }
    }
    "Unknown".to_string()
}
