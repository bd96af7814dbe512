//! Signing-certificate key set and the fetchers that retrieve it.
//!
//! Google publishes the current Firebase signing certificates as a JSON
//! object mapping key IDs to PEM-encoded X.509 certificates. The key set is
//! fetched once per verification; there is no cache.
//!
//! # Security
//!
//! - HTTPS should be used in production (enforced by deployment config)
//! - Fetch failures are reported as a single generic kind with no detail

use crate::observability::metrics;
use common::jwt::TokenError;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

/// Google's x509 metadata endpoint for Firebase ID token signing certificates.
pub const DEFAULT_CERTS_URL: &str =
    "https://www.googleapis.com/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";

/// Default timeout for key set fetches in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Mapping from key ID to PEM certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct KeySet(HashMap<String, String>);

impl KeySet {
    /// PEM certificate for `kid`, if present.
    pub fn get(&self, kid: &str) -> Option<&str> {
        self.0.get(kid).map(String::as_str)
    }

    /// Number of certificates in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no certificates.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(kid, pem)| (kid.into(), pem.into()))
                .collect(),
        )
    }
}

/// Source of the current key set.
///
/// Abstracted so verification can run against a fixed key set in tests.
#[async_trait::async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Retrieve the current key set.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::KeyFetchError` if the key set cannot be retrieved.
    async fn fetch_key_set(&self) -> Result<KeySet, TokenError>;
}

/// Fetches the key set over HTTP.
pub struct HttpKeySetFetcher {
    /// URL of the certificate endpoint.
    certs_url: String,

    /// HTTP client for fetching the key set.
    http_client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new(certs_url: String) -> Self {
        Self::with_timeout(
            certs_url,
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
        )
    }

    /// Create a fetcher with a custom request timeout.
    pub fn with_timeout(certs_url: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "todo.auth.certs", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            certs_url,
            http_client,
        }
    }

    async fn fetch(&self) -> Result<KeySet, TokenError> {
        tracing::debug!(target: "todo.auth.certs", url = %self.certs_url, "Fetching signing certificates");

        let response = self
            .http_client
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "todo.auth.certs", error = %e, "Failed to fetch signing certificates");
                TokenError::KeyFetchError
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "todo.auth.certs",
                status = %response.status(),
                "Certificate endpoint returned error"
            );
            return Err(TokenError::KeyFetchError);
        }

        let key_set: KeySet = response.json().await.map_err(|e| {
            tracing::error!(target: "todo.auth.certs", error = %e, "Failed to parse certificate response");
            TokenError::KeyFetchError
        })?;

        tracing::debug!(target: "todo.auth.certs", key_count = key_set.len(), "Signing certificates fetched");

        Ok(key_set)
    }
}

#[async_trait::async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    #[instrument(skip(self), name = "todo.auth.fetch_key_set")]
    async fn fetch_key_set(&self) -> Result<KeySet, TokenError> {
        let result = self.fetch().await;
        metrics::record_key_set_fetch(if result.is_ok() { "success" } else { "error" });
        result
    }
}

/// Mock key set fetchers for testing.
///
/// This module provides in-memory fetchers for use in tests.
pub mod mock {

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher that always returns the same key set.
    pub struct StaticKeySetFetcher {
        key_set: KeySet,
        call_count: AtomicUsize,
    }

    impl StaticKeySetFetcher {
        /// Create a fetcher that serves `key_set` on every call.
        pub fn new(key_set: KeySet) -> Self {
            Self {
                key_set,
                call_count: AtomicUsize::new(0),
            }
        }

        /// Get the number of fetches made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl KeySetFetcher for StaticKeySetFetcher {
        async fn fetch_key_set(&self) -> Result<KeySet, TokenError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(self.key_set.clone())
        }
    }

    /// Fetcher that always fails with `KeyFetchError`.
    #[derive(Default)]
    pub struct FailingKeySetFetcher {
        call_count: AtomicUsize,
    }

    impl FailingKeySetFetcher {
        /// Create a fetcher with a zeroed call count.
        pub fn new() -> Self {
            Self::default()
        }

        /// Get the number of fetches made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl KeySetFetcher for FailingKeySetFetcher {
        async fn fetch_key_set(&self) -> Result<KeySet, TokenError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Err(TokenError::KeyFetchError)
        }
    }
}
