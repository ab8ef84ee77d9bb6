//! Device discovery and attribute queries
//!
//! Thin wrapper over the libimobiledevice tools. Every query is a
//! single round-trip with no retry: a value the device does not expose
//! comes back as `Ok(None)`, and only a failure to spawn the tool at
//! all is an error.

use crate::error::{DevitalsError, DevitalsResult};
use crate::toolchain::{IDEVICE_ID, IDEVICEINFO};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// Identity of a connected device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// User-visible device name
    pub name: String,
    /// Hardware product type (e.g. "iPhone14,2")
    pub model: String,
    /// OS version string
    pub version: String,
    /// Unique device identifier
    pub udid: String,
    /// Serial number
    pub serial: String,
}

/// Run a tool, returning its stdout on success and `None` on failure
///
/// A non-zero exit means the device rejected or does not support the
/// request; that is an absent value, not an error. Only a spawn
/// failure (tool not installed) propagates.
pub(crate) async fn run_tool(tool: &str, args: &[&str]) -> DevitalsResult<Option<String>> {
    let output = match Command::new(tool).args(args).output().await {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DevitalsError::toolchain_missing(tool));
        }
        Err(e) => return Err(e.into()),
    };

    if !output.status.success() {
        tracing::debug!(tool, ?args, code = ?output.status.code(), "tool exited non-zero");
        return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}

/// Raw textual value of one device attribute, or `None` if unsupported
pub async fn query_device_field(udid: &str, key: &str) -> DevitalsResult<Option<String>> {
    let stdout = run_tool(IDEVICEINFO, &["-u", udid, "-k", key]).await?;
    Ok(stdout.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// UDIDs of all connected devices
pub async fn list_udids() -> DevitalsResult<Vec<String>> {
    let Some(stdout) = run_tool(IDEVICE_ID, &["-l"]).await? else {
        return Ok(Vec::new());
    };

    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Identity of one device from its full attribute dump
///
/// `None` when the device does not answer (disconnected, locked down).
pub async fn device_info(udid: &str) -> DevitalsResult<Option<DeviceInfo>> {
    let Some(stdout) = run_tool(IDEVICEINFO, &["-u", udid]).await? else {
        return Ok(None);
    };

    Ok(Some(parse_device_info(udid, &stdout)))
}

/// All connected devices that answer an attribute dump
pub async fn list_devices() -> DevitalsResult<Vec<DeviceInfo>> {
    let mut devices = Vec::new();
    for udid in list_udids().await? {
        match device_info(&udid).await? {
            Some(info) => devices.push(info),
            None => tracing::warn!(udid, "device did not answer attribute query"),
        }
    }
    Ok(devices)
}

/// Resolve a UDID prefix to a connected device
///
/// With no prefix the first connected device is chosen. An empty device
/// list or an unmatched prefix is `DeviceNotFound`.
pub async fn resolve_device(prefix: Option<&str>) -> DevitalsResult<DeviceInfo> {
    let devices = list_devices().await?;

    let found = match prefix {
        Some(prefix) => devices.into_iter().find(|d| d.udid.starts_with(prefix)),
        None => devices.into_iter().next(),
    };

    found.ok_or_else(|| DevitalsError::device_not_found(prefix.unwrap_or("<any>")))
}

fn parse_device_info(udid: &str, dump: &str) -> DeviceInfo {
    let mut name = None;
    let mut model = None;
    let mut version = None;
    let mut serial = None;

    for line in dump.lines() {
        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        match key {
            "DeviceName" => name = Some(value.trim().to_string()),
            "ProductType" => model = Some(value.trim().to_string()),
            "ProductVersion" => version = Some(value.trim().to_string()),
            "SerialNumber" => serial = Some(value.trim().to_string()),
            _ => {}
        }
    }

    let unknown = || "Unknown".to_string();
    DeviceInfo {
        name: name.unwrap_or_else(unknown),
        model: model.unwrap_or_else(unknown),
        version: version.unwrap_or_else(unknown),
        udid: udid.to_string(),
        serial: serial.unwrap_or_else(unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "ActivationState: Activated\n\
        DeviceName: Field iPhone\n\
        ProductType: iPhone14,2\n\
        ProductVersion: 17.5.1\n\
        SerialNumber: F2LXK3JQ0D\n\
        WiFiAddress: aa:bb:cc:dd:ee:ff\n";

    #[test]
    fn test_parse_device_info() {
        let info = parse_device_info("00008030-test", DUMP);
        assert_eq!(info.name, "Field iPhone");
        assert_eq!(info.model, "iPhone14,2");
        assert_eq!(info.version, "17.5.1");
        assert_eq!(info.serial, "F2LXK3JQ0D");
        assert_eq!(info.udid, "00008030-test");
    }

    #[test]
    fn test_parse_device_info_missing_keys_default_unknown() {
        let info = parse_device_info("x", "SomeKey: value\nMalformed line\n");
        assert_eq!(info.name, "Unknown");
        assert_eq!(info.model, "Unknown");
        assert_eq!(info.version, "Unknown");
        assert_eq!(info.serial, "Unknown");
    }

    #[test]
    fn test_parse_device_info_keeps_colons_in_values() {
        let info = parse_device_info("x", "DeviceName: Ada's iPhone: Work\n");
        assert_eq!(info.name, "Ada's iPhone: Work");
    }

    #[tokio::test]
    async fn test_run_tool_missing_binary_is_toolchain_error() {
        let result = run_tool("devitals-no-such-tool", &[]).await;
        assert!(matches!(
            result,
            Err(DevitalsError::ToolchainMissing { .. })
        ));
    }
}
