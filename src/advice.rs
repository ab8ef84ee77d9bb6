//! Remediation advice client
//!
//! Asks a hosted language model for free-text troubleshooting advice
//! about a described device problem. One request, one response, no
//! retry: callers that want resilience wrap this themselves.

use crate::device::DeviceInfo;
use crate::error::{DevitalsError, DevitalsResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
/// Default model for advice requests
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
/// Response budget for advice text
const MAX_TOKENS: u32 = 1024;
/// API version header value
const API_VERSION: &str = "2023-06-01";
/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "DEVITALS_API_KEY";

/// Advice client configuration
#[derive(Debug, Clone)]
pub struct AdviceConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        AdviceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Client for the hosted advice service
#[derive(Debug)]
pub struct AdviceClient {
    client: reqwest::Client,
    api_key: String,
    config: AdviceConfig,
}

#[derive(Debug, Serialize)]
struct AdviceRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AdviceMessage>,
}

#[derive(Debug, Serialize)]
struct AdviceMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AdviceResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AdviceClient {
    /// Create a client with an explicit key and configuration
    pub fn new(api_key: impl Into<String>, config: AdviceConfig) -> DevitalsResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(DevitalsError::advice_error("API key is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                DevitalsError::advice_error(&format!("failed to build HTTP client: {e}"))
            })?;

        Ok(AdviceClient {
            client,
            api_key,
            config,
        })
    }

    /// Create a client from the `DEVITALS_API_KEY` environment variable
    pub fn from_env() -> DevitalsResult<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            DevitalsError::advice_error(&format!("{API_KEY_ENV} is not set"))
        })?;
        Self::new(api_key, AdviceConfig::default())
    }

    /// Ask for step-by-step troubleshooting advice for a problem
    pub async fn suggest_solution(
        &self,
        problem: &str,
        device: &DeviceInfo,
    ) -> DevitalsResult<String> {
        let prompt = format!(
            "iOS troubleshooting request:\n\
             Problem: {problem}\n\
             Device: {model}\n\
             iOS Version: {version}\n\n\
             Provide step-by-step troubleshooting instructions.",
            model = device.model,
            version = device.version,
        );
        self.complete(prompt).await
    }

    async fn complete(&self, prompt: String) -> DevitalsResult<String> {
        let request = AdviceRequest {
            model: self.config.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![AdviceMessage {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/messages", self.config.base_url);
        tracing::debug!(url = %url, model = %self.config.model, "sending advice request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DevitalsError::advice_error(&format!(
                        "request timed out after {}ms",
                        self.config.timeout_ms
                    ))
                } else {
                    DevitalsError::advice_error(&e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DevitalsError::advice_error(&format!(
                "status {status}: {body}"
            )));
        }

        let parsed: AdviceResponse = response
            .json()
            .await
            .map_err(|e| DevitalsError::advice_error(&format!("malformed response: {e}")))?;

        parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .ok_or_else(|| DevitalsError::advice_error("response contained no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = AdviceClient::new("", AdviceConfig::default());
        assert!(matches!(result, Err(DevitalsError::AdviceError { .. })));
    }

    #[test]
    fn test_client_builds_with_key() {
        let client = AdviceClient::new("key-for-tests", AdviceConfig::default()).unwrap();
        assert_eq!(client.config.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = AdviceRequest {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 256,
            messages: vec![AdviceMessage {
                role: "user",
                content: "battery drains fast".to_string(),
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "battery drains fast");
    }

    #[test]
    fn test_response_parsing_picks_first_text_block() {
        let body = r#"{
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "1. Restart the device."}
            ]
        }"#;

        let parsed: AdviceResponse = serde_json::from_str(body).unwrap();
        let text = parsed.content.into_iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        });
        assert_eq!(text.as_deref(), Some("1. Restart the device."));
    }

    #[test]
    fn test_from_env_without_key_is_error() {
        if std::env::var(API_KEY_ENV).is_err() {
            assert!(matches!(
                AdviceClient::from_env(),
                Err(DevitalsError::AdviceError { .. })
            ));
        }
    }

}
