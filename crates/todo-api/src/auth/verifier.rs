//! Firebase ID token verification.
//!
//! Runs the verification pipeline for a bearer token:
//!
//! ```text
//! Received -> Decoded -> ClaimsValid -> KeysFetched -> KeyExtracted
//!          -> SignatureChecked -> Authenticated
//! ```
//!
//! Any stage may reject. Stages are pure and return outcomes; this module is
//! the only place that logs verification results or records metrics.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Claims are checked before any network I/O, so bad tokens never cost a fetch
//! - Only RS256 is accepted, regardless of the header's `alg`
//! - Signature failures of any kind are reported as `SignatureInvalid`

use crate::auth::certs::KeySetFetcher;
use crate::auth::claims::{validate_claims_at, AuthenticatedIdentity, ClaimPolicy, IdTokenClaims};
use crate::auth::signature::verify_signature;
use crate::observability::metrics;
use common::jwt::{decode_token, now_epoch_seconds, TokenError};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Verifies Firebase ID tokens for one project.
///
/// Holds no mutable state; share it behind an `Arc`.
pub struct TokenVerifier {
    /// Source of the current signing certificates.
    fetcher: Arc<dyn KeySetFetcher>,

    /// Expected audience, issuer and clock skew.
    policy: ClaimPolicy,
}

impl TokenVerifier {
    /// Create a new token verifier.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of the signing-certificate key set
    /// * `policy` - Claim requirements for this project
    pub fn new(fetcher: Arc<dyn KeySetFetcher>, policy: ClaimPolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Verify a token against the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns the `TokenError` of the first stage that rejects the token.
    pub async fn verify(&self, token: &str) -> Result<AuthenticatedIdentity, TokenError> {
        self.verify_at(token, now_epoch_seconds()).await
    }

    /// Verify a token as of `now` (Unix epoch seconds).
    ///
    /// # Errors
    ///
    /// Returns the `TokenError` of the first stage that rejects the token.
    #[instrument(skip_all, name = "todo.auth.verify_token")]
    pub async fn verify_at(
        &self,
        token: &str,
        now: i64,
    ) -> Result<AuthenticatedIdentity, TokenError> {
        let start = Instant::now();
        let result = self.run_pipeline(token, now).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::debug!(target: "todo.auth.verifier", "Token verified successfully");
                metrics::record_token_verification("success", duration);
            }
            Err(TokenError::KeyFetchError) => {
                tracing::warn!(target: "todo.auth.verifier", outcome = "key_fetch_error", "Token verification unavailable");
                metrics::record_token_verification(TokenError::KeyFetchError.kind(), duration);
            }
            Err(TokenError::KeyExtractionError(reason)) => {
                tracing::warn!(
                    target: "todo.auth.verifier",
                    outcome = "key_extraction_error",
                    reason = %reason,
                    "Signing certificate rejected"
                );
                metrics::record_token_verification("key_extraction_error", duration);
            }
            Err(e) => {
                tracing::debug!(target: "todo.auth.verifier", outcome = e.kind(), "Token rejected");
                metrics::record_token_verification(e.kind(), duration);
            }
        }

        result
    }

    async fn run_pipeline(
        &self,
        token: &str,
        now: i64,
    ) -> Result<AuthenticatedIdentity, TokenError> {
        let decoded = decode_token::<IdTokenClaims>(token)?;

        validate_claims_at(&decoded.claims, &self.policy, now)?;

        let key_set = self.fetcher.fetch_key_set().await?;

        if !verify_signature(&key_set, &decoded)? {
            return Err(TokenError::SignatureInvalid);
        }

        Ok(AuthenticatedIdentity::from(decoded.claims))
    }
}
