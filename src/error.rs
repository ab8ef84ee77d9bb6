//! Error handling module
//!
//! Defines all error types and result types used in the devitals library.

use std::io;
use thiserror::Error;

/// Error types for the devitals library
#[derive(Error, Debug)]
pub enum DevitalsError {
    /// I/O error, typically occurs when running external tools
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A required libimobiledevice tool is not installed
    #[error("Required tool '{tool}' not found. Install libimobiledevice and retry.")]
    ToolchainMissing { tool: String },

    /// Data parsing error
    #[error("Failed to parse device data: {detail}")]
    ParseError { detail: String },

    /// History storage failure (unreadable or unwritable medium)
    #[error("History storage failure at {path}: {detail}")]
    StorageFailure { path: String, detail: String },

    /// No device matched the requested identifier
    #[error("Device not found: {udid}")]
    DeviceNotFound { udid: String },

    /// Advice service error (missing key, transport, bad response)
    #[error("Advice service error: {detail}")]
    AdviceError { detail: String },

    /// Invalid value error
    #[error("Invalid value: {detail}")]
    InvalidValue { detail: String },
}

impl DevitalsError {
    /// Create toolchain missing error
    #[allow(dead_code)]
    pub(crate) fn toolchain_missing(tool: &str) -> Self {
        DevitalsError::ToolchainMissing {
            tool: tool.to_string(),
        }
    }

    /// Create parsing error
    #[allow(dead_code)]
    pub(crate) fn parse_error(detail: &str) -> Self {
        DevitalsError::ParseError {
            detail: detail.to_string(),
        }
    }

    /// Create storage failure error
    #[allow(dead_code)]
    pub(crate) fn storage_failure(path: &std::path::Path, detail: &str) -> Self {
        DevitalsError::StorageFailure {
            path: path.display().to_string(),
            detail: detail.to_string(),
        }
    }

    /// Create device not found error
    #[allow(dead_code)]
    pub(crate) fn device_not_found(udid: &str) -> Self {
        DevitalsError::DeviceNotFound {
            udid: udid.to_string(),
        }
    }

    /// Create advice service error
    #[allow(dead_code)]
    pub(crate) fn advice_error(detail: &str) -> Self {
        DevitalsError::AdviceError {
            detail: detail.to_string(),
        }
    }

    /// Create invalid value error
    #[allow(dead_code)]
    pub(crate) fn invalid_value(detail: &str) -> Self {
        DevitalsError::InvalidValue {
            detail: detail.to_string(),
        }
    }
}

/// Result type for the devitals library
pub type DevitalsResult<T> = Result<T, DevitalsError>;
