//! Dispatcher Settings
//!
//! Defines the configuration schema for the dispatcher and its Gemini backend.

use crate::client::gemini::DEFAULT_BASE_URL;
use crate::router::credentials::{DEFAULT_CREDENTIAL_ENV, DEFAULT_MIN_CREDENTIAL_LENGTH};
use crate::router::DEFAULT_RETRIES;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Environment variables holding API keys, highest priority first
    pub credential_env: Vec<String>,

    /// Keys shorter than this are ignored
    pub min_credential_length: usize,

    /// Retries after the first failed attempt
    pub default_retries: u32,

    /// Flat pause between attempts, in milliseconds
    pub retry_delay_ms: u64,

    /// Which failures rotate to the next key
    pub rotation_policy: RotationMode,

    /// Model used by the advisory prompts
    pub model: String,

    /// Base URL for the API
    pub base_url: String,

    /// Optional environment variable for a custom base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url_env: Option<String>,

    /// Per-request timeout; unset leaves the HTTP client default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            credential_env: DEFAULT_CREDENTIAL_ENV.iter().map(|s| s.to_string()).collect(),
            min_credential_length: DEFAULT_MIN_CREDENTIAL_LENGTH,
            default_retries: DEFAULT_RETRIES,
            retry_delay_ms: 0,
            rotation_policy: RotationMode::default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            base_url_env: None,
            request_timeout_secs: None,
        }
    }
}

/// Serializable rotation policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Rotate only on rate limit, quota, and transient failures
    #[default]
    Classified,

    /// Rotate on any failure
    AnyError,
}

impl DispatcherSettings {
    /// Get the effective base URL (from env var if configured, otherwise default)
    pub fn get_base_url(&self) -> String {
        if let Some(env_var) = &self.base_url_env {
            if let Ok(url) = std::env::var(env_var) {
                return url;
            }
        }
        self.base_url.clone()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DispatcherSettings::default();
        assert_eq!(
            settings.credential_env,
            vec!["GEMINI_API_KEY", "GEMINI_API_KEY_2", "GEMINI_API_KEY_3"]
        );
        assert_eq!(settings.default_retries, 2);
        assert_eq!(settings.retry_delay(), Duration::ZERO);
        assert_eq!(settings.rotation_policy, RotationMode::Classified);
        assert!(settings.request_timeout().is_none());
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let json = r#"{
            "credential_env": ["FARM_KEY"],
            "retry_delay_ms": 300,
            "rotation_policy": "any_error"
        }"#;

        let settings: DispatcherSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.credential_env, vec!["FARM_KEY"]);
        assert_eq!(settings.retry_delay(), Duration::from_millis(300));
        assert_eq!(settings.rotation_policy, RotationMode::AnyError);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_base_url_env_override() {
        std::env::set_var("AGRISENSE_TEST_BASE_URL", "http://localhost:9999");
        let settings = DispatcherSettings {
            base_url_env: Some("AGRISENSE_TEST_BASE_URL".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.get_base_url(), "http://localhost:9999");

        let unset = DispatcherSettings {
            base_url_env: Some("AGRISENSE_TEST_BASE_URL_UNSET".to_string()),
            ..Default::default()
        };
        assert_eq!(unset.get_base_url(), DEFAULT_BASE_URL);
    }
}
