//! Todo API configuration.
//!
//! Configuration is loaded from environment variables. Nothing here is
//! secret, so the derived Debug output is safe to log.

use crate::auth::certs::{DEFAULT_CERTS_URL, DEFAULT_FETCH_TIMEOUT_SECONDS};
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Upper bound for the key fetch timeout in seconds.
pub const MAX_KEY_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Version reported by the health endpoint when none is configured.
pub const DEFAULT_BUILD_VERSION: &str = "dev";

/// Todo API configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Firebase project ID. Tokens must carry it as their audience.
    pub firebase_project_id: String,

    /// URL of the signing-certificate key set.
    pub firebase_certs_url: String,

    /// Clock skew tolerance in seconds for `iat` validation.
    pub jwt_clock_skew_seconds: u64,

    /// Timeout in seconds for key set fetches.
    pub key_fetch_timeout_seconds: u64,

    /// Version string reported by `/api/health`.
    pub build_version: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid key fetch timeout configuration: {0}")]
    InvalidKeyFetchTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let firebase_project_id = vars
            .get("FIREBASE_PROJECT_ID")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("FIREBASE_PROJECT_ID".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let firebase_certs_url = vars
            .get("FIREBASE_CERTS_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CERTS_URL.to_string());

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            let value = u64::try_from(value)
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidJwtClockSkew(format!(
                        "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                        value
                    ))
                })?;

            if value > MAX_CLOCK_SKEW.as_secs() {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs()
        };

        // Parse key fetch timeout with validation
        let key_fetch_timeout_seconds =
            if let Some(value_str) = vars.get("KEY_FETCH_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidKeyFetchTimeout(format!(
                        "KEY_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 || value > MAX_KEY_FETCH_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidKeyFetchTimeout(format!(
                        "KEY_FETCH_TIMEOUT_SECONDS must be between 1 and {} seconds, got {}",
                        MAX_KEY_FETCH_TIMEOUT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_FETCH_TIMEOUT_SECONDS
            };

        let build_version = vars
            .get("BUILD_VERSION")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BUILD_VERSION.to_string());

        Ok(Config {
            bind_address,
            firebase_project_id,
            firebase_certs_url,
            jwt_clock_skew_seconds,
            key_fetch_timeout_seconds,
            build_version,
        })
    }

    /// Clock skew tolerance for `iat` validation.
    pub fn jwt_clock_skew(&self) -> Duration {
        Duration::from_secs(self.jwt_clock_skew_seconds)
    }

    /// Timeout applied to each key set fetch.
    pub fn key_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.key_fetch_timeout_seconds)
    }
}
