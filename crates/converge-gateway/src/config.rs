//! Gateway configuration.
//!
//! Endpoint, API key and timeout settings for the administrative API.
//! Configuration is loaded from environment variables with defaults
//! suitable for local development.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::retry::RetryConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Configuration for the remote administrative API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// API endpoint.
    pub endpoint: ApiEndpoint,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries after the first attempt for idempotent requests.
    pub max_retries: u32,

    /// Whether to verify TLS certificates (disable only for testing).
    pub verify_tls: bool,
}

impl Default for GatewayConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            endpoint: ApiEndpoint {
                base_url: "http://localhost:9000".to_string(),
                api_key: None,
            },
            timeout_secs: 30,
            max_retries: 3,
            verify_tls: true,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CONVERGE_API_URL`: API base URL (default: http://localhost:9000)
    /// - `CONVERGE_API_KEY`: API key sent as a bearer token
    /// - `CONVERGE_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `CONVERGE_MAX_RETRIES`: Retries for idempotent requests (default: 3)
    /// - `CONVERGE_VERIFY_TLS`: Whether to verify TLS (default: true)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            endpoint: ApiEndpoint {
                base_url: std::env::var("CONVERGE_API_URL")
                    .unwrap_or(default.endpoint.base_url),
                api_key: std::env::var("CONVERGE_API_KEY").ok(),
            },
            timeout_secs: std::env::var("CONVERGE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            max_retries: std::env::var("CONVERGE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
            verify_tls: std::env::var("CONVERGE_VERIFY_TLS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.verify_tls),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for idempotent requests.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retries.saturating_add(1),
            ..RetryConfig::default()
        }
    }

    /// Check that the configuration is usable at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.endpoint.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "CONVERGE_API_URL".to_string(),
                message: format!("expected an http(s) URL, got '{}'", url),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CONVERGE_TIMEOUT_SECS".to_string(),
                message: "timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    /// Validate that all required configuration is present for production.
    ///
    /// In production, the API key must be configured.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.endpoint.api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("CONVERGE_API_KEY".to_string()));
        }
        Ok(())
    }
}

/// Base URL and credentials of the administrative API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// Base URL (e.g., "https://admin.example.com").
    pub base_url: String,

    /// API key for bearer authentication.
    pub api_key: Option<String>,
}

impl ApiEndpoint {
    /// Check if API key authentication is available.
    pub fn has_auth(&self) -> bool {
        self.api_key.is_some()
    }
}
