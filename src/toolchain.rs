//! Toolchain detection module
//!
//! Probes for the libimobiledevice command-line tools the rest of the
//! crate shells out to. Nothing here talks to a device; it only answers
//! "can we expect these binaries to run".

use crate::error::{DevitalsError, DevitalsResult};

/// Device enumeration tool
pub const IDEVICE_ID: &str = "idevice_id";
/// Key/value device attribute tool
pub const IDEVICEINFO: &str = "ideviceinfo";
/// Installed-app listing tool
pub const IDEVICEINSTALLER: &str = "ideviceinstaller";

/// Tools required for the core diagnostic surface
pub const REQUIRED_TOOLS: [&str; 2] = [IDEVICE_ID, IDEVICEINFO];

/// Check that the required libimobiledevice tools are on PATH
pub async fn check_toolchain() -> DevitalsResult<()> {
    for tool in REQUIRED_TOOLS {
        if !tool_available(tool).await {
            return Err(DevitalsError::toolchain_missing(tool));
        }
    }
    Ok(())
}

/// Whether a single tool can be spawned
pub async fn tool_available(tool: &str) -> bool {
    // -v prints a version banner without touching any device; some
    // builds exit non-zero for it, which still proves the binary runs
    tokio::process::Command::new(tool)
        .arg("-v")
        .output()
        .await
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        assert!(!tool_available("devitals-no-such-tool").await);
    }

    #[tokio::test]
    async fn test_check_toolchain_error_names_tool() {
        // In environments without libimobiledevice the check must fail
        // with the missing tool's name; with it installed it passes.
        match check_toolchain().await {
            Ok(()) => {}
            Err(DevitalsError::ToolchainMissing { tool }) => {
                assert!(REQUIRED_TOOLS.contains(&tool.as_str()));
            }
            Err(e) => panic!("Unexpected error: {e}"),
        }
    }
}
