//! Compact signed-token utilities shared across the Todo API crates.
//!
//! This module provides the pieces of ID-token verification that do not
//! depend on any key material:
//! - Size limits for DoS prevention
//! - Clock skew constants for iat validation
//! - The rejection taxonomy (`TokenError`)
//! - base64url segment decoding
//! - Splitting and decoding a compact token into header, claims and signature
//! - iat validation logic
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Decoding never implies authenticity: the signature is verified separately
//! - Every rejection displays the same generic message; the specific kind is
//!   available through [`TokenError::kind`] for logs and metrics
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{decode_token, validate_iat_at, DEFAULT_CLOCK_SKEW};
//!
//! let decoded = decode_token::<IdTokenClaims>(token)?;
//! validate_iat_at(decoded.claims.iat, DEFAULT_CLOCK_SKEW, now)?;
//! let kid = &decoded.header.kid;
//! ```

use base64::{
    alphabet,
    engine::{general_purpose, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed token size in bytes (8KB).
///
/// Typical Firebase ID tokens are 900-1200 bytes. Anything larger than this
/// is rejected before base64 decoding or JSON parsing.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default clock skew tolerance for the `iat` claim (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum configurable clock skew tolerance (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Issuer prefix for Firebase ID tokens. The project ID is appended.
pub const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Message surfaced to callers for every rejection.
pub const GENERIC_REJECTION_MESSAGE: &str = "authentication failed";

/// Standard-alphabet engine that tolerates non-zero trailing bits, matching
/// browser `atob` behaviour on the final quantum.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

// =============================================================================
// Error Types
// =============================================================================

/// Reasons a bearer token is rejected.
///
/// Display output is intentionally identical for every variant to prevent
/// information leakage. Use [`TokenError::kind`] when logging or recording
/// metrics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Wrong segment count, undecodable base64url, or undecodable JSON.
    #[error("authentication failed")]
    MalformedToken,

    /// The `exp` claim is missing or not in the future.
    #[error("authentication failed")]
    TokenExpired,

    /// The `iat` claim is missing or too far in the future.
    #[error("authentication failed")]
    TokenNotYetValid,

    /// The `aud` claim does not match the expected project.
    #[error("authentication failed")]
    InvalidAudience,

    /// The `iss` claim does not match the expected issuer.
    #[error("authentication failed")]
    InvalidIssuer,

    /// The `sub` claim is missing or empty.
    #[error("authentication failed")]
    MissingSubject,

    /// The current key set could not be retrieved.
    #[error("authentication failed")]
    KeyFetchError,

    /// The header's `kid` is not present in the fetched key set.
    #[error("authentication failed")]
    KeyNotFound,

    /// The certificate did not yield a recognisable RSA public key.
    ///
    /// The reason is a fixed internal label for server-side logs.
    #[error("authentication failed")]
    KeyExtractionError(&'static str),

    /// The signature did not verify.
    #[error("authentication failed")]
    SignatureInvalid,
}

impl TokenError {
    /// Stable snake_case code for logs and metric labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::MalformedToken => "malformed_token",
            TokenError::TokenExpired => "token_expired",
            TokenError::TokenNotYetValid => "token_not_yet_valid",
            TokenError::InvalidAudience => "invalid_audience",
            TokenError::InvalidIssuer => "invalid_issuer",
            TokenError::MissingSubject => "missing_subject",
            TokenError::KeyFetchError => "key_fetch_error",
            TokenError::KeyNotFound => "key_not_found",
            TokenError::KeyExtractionError(_) => "key_extraction_error",
            TokenError::SignatureInvalid => "signature_invalid",
        }
    }
}

// =============================================================================
// Token Types
// =============================================================================

/// Decoded token header.
///
/// Only `kid` is consulted, to select a verification key. `alg` is never
/// trusted: the verification algorithm is fixed by the verifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Algorithm claimed by the issuer.
    #[serde(default)]
    pub alg: String,

    /// Key identifier.
    #[serde(default)]
    pub kid: String,

    /// Token type (usually "JWT").
    #[serde(default)]
    pub typ: String,
}

/// A compact token split into its decoded parts.
///
/// Borrows the original segment text so the signing input can be rebuilt
/// byte-for-byte.
#[derive(Debug, Clone)]
pub struct DecodedToken<'a, C> {
    /// Decoded header.
    pub header: TokenHeader,

    /// Decoded payload claims.
    pub claims: C,

    /// Raw signature bytes.
    pub signature: Vec<u8>,

    header_segment: &'a str,
    payload_segment: &'a str,
}

impl<C> DecodedToken<'_, C> {
    /// The bytes that were signed: `header_segment + "." + payload_segment`,
    /// using the original base64url text.
    #[must_use]
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_segment, self.payload_segment)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Decode one base64url segment.
///
/// `-` and `_` are mapped back to `+` and `/`, padding is restored to a
/// multiple of four characters, and the result is decoded as standard base64.
///
/// # Errors
///
/// Returns `base64::DecodeError` if the segment is not valid base64url.
pub fn decode_base64url(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let padding = (4 - standard.len() % 4) % 4;
    standard.extend(std::iter::repeat('=').take(padding));

    LENIENT_STANDARD.decode(standard)
}

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn encode_base64url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Split and decode a compact token into header, claims and signature.
///
/// This function does NOT verify the signature. The returned claims must not
/// be trusted until the signature has been checked against the signing input.
///
/// # Errors
///
/// Returns `TokenError::MalformedToken` when:
/// - the token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - the token does not have exactly three `.`-separated segments
/// - any segment is not valid base64url
/// - the header or payload is not valid JSON for its type
pub fn decode_token<C: DeserializeOwned>(token: &str) -> Result<DecodedToken<'_, C>, TokenError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        return Err(TokenError::MalformedToken);
    }

    let mut segments = token.split('.');
    let (Some(header_segment), Some(payload_segment), Some(signature_segment), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::MalformedToken);
    };

    let header_bytes = decode_base64url(header_segment)
        .map_err(|_| TokenError::MalformedToken)?;
    let payload_bytes = decode_base64url(payload_segment)
        .map_err(|_| TokenError::MalformedToken)?;
    let signature = decode_base64url(signature_segment)
        .map_err(|_| TokenError::MalformedToken)?;

    let header: TokenHeader = serde_json::from_slice(&header_bytes)
        .map_err(|_| TokenError::MalformedToken)?;
    let claims: C = serde_json::from_slice(&payload_bytes)
        .map_err(|_| TokenError::MalformedToken)?;

    Ok(DecodedToken {
        header,
        claims,
        signature,
        header_segment,
        payload_segment,
    })
}

/// Validate the `iat` (issued-at) claim against an explicit `now`.
///
/// A missing `iat`, or one more than `clock_skew` beyond `now`, is rejected.
///
/// # Errors
///
/// Returns `TokenError::TokenNotYetValid` if the claim is absent or too far
/// in the future.
pub fn validate_iat_at(iat: Option<i64>, clock_skew: Duration, now: i64) -> Result<(), TokenError> {
    let clock_skew_secs = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);
    let max_iat = now.saturating_add(clock_skew_secs);

    match iat {
        Some(iat) if iat <= max_iat => Ok(()),
        _ => Err(TokenError::TokenNotYetValid),
    }
}

/// Current wall-clock time in Unix epoch seconds.
#[must_use]
pub fn now_epoch_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn segment(value: &Value) -> String {
        encode_base64url(value.to_string().as_bytes())
    }

    fn token_with(header: &Value, payload: &Value, signature: &[u8]) -> String {
        format!(
            "{}.{}.{}",
            segment(header),
            segment(payload),
            encode_base64url(signature)
        )
    }

    // -------------------------------------------------------------------------
    // Constants Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_max_jwt_size_is_8kb() {
        assert_eq!(MAX_JWT_SIZE_BYTES, 8192);
    }

    #[test]
    fn test_default_clock_skew_is_5_minutes() {
        assert_eq!(DEFAULT_CLOCK_SKEW, Duration::from_secs(300));
    }

    #[test]
    fn test_issuer_prefix() {
        assert_eq!(FIREBASE_ISSUER_PREFIX, "https://securetoken.google.com/");
    }

    // -------------------------------------------------------------------------
    // TokenError Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_every_rejection_displays_generic_message() {
        let errors = [
            TokenError::MalformedToken,
            TokenError::TokenExpired,
            TokenError::TokenNotYetValid,
            TokenError::InvalidAudience,
            TokenError::InvalidIssuer,
            TokenError::MissingSubject,
            TokenError::KeyFetchError,
            TokenError::KeyNotFound,
            TokenError::KeyExtractionError("invalid certificate format"),
            TokenError::SignatureInvalid,
        ];

        for error in errors {
            assert_eq!(error.to_string(), GENERIC_REJECTION_MESSAGE);
        }
    }

    #[test]
    fn test_kind_codes_are_distinct() {
        let kinds = [
            TokenError::MalformedToken.kind(),
            TokenError::TokenExpired.kind(),
            TokenError::TokenNotYetValid.kind(),
            TokenError::InvalidAudience.kind(),
            TokenError::InvalidIssuer.kind(),
            TokenError::MissingSubject.kind(),
            TokenError::KeyFetchError.kind(),
            TokenError::KeyNotFound.kind(),
            TokenError::KeyExtractionError("x").kind(),
            TokenError::SignatureInvalid.kind(),
        ];

        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
        assert_eq!(TokenError::KeyNotFound.kind(), "key_not_found");
    }

    // -------------------------------------------------------------------------
    // decode_base64url Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_base64url_restores_padding() {
        // "hi" is "aGk" unpadded
        assert_eq!(decode_base64url("aGk").unwrap(), b"hi");
        // Already-padded input is accepted too
        assert_eq!(decode_base64url("aGk=").unwrap(), b"hi");
    }

    #[test]
    fn test_decode_base64url_maps_url_safe_alphabet() {
        // 0xfb 0xff encodes to "-_8" in base64url and "+/8=" in standard base64
        assert_eq!(decode_base64url("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_base64url("+/8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_base64url_rejects_garbage() {
        assert!(decode_base64url("!!!invalid!!!").is_err());
        // A single trailing character can never be valid base64
        assert!(decode_base64url("abcde").is_err());
    }

    // -------------------------------------------------------------------------
    // decode_token Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_token_recovers_header_and_claims() {
        let header = json!({"alg": "RS256", "kid": "abc", "typ": "JWT"});
        let payload = json!({"sub": "u1", "email": "a@b.com", "exp": 2_000_000_000_i64});
        let token = token_with(&header, &payload, b"sig-bytes");

        let decoded = decode_token::<Value>(&token).unwrap();

        assert_eq!(decoded.header.alg, "RS256");
        assert_eq!(decoded.header.kid, "abc");
        assert_eq!(decoded.header.typ, "JWT");
        assert_eq!(decoded.claims, payload);
        assert_eq!(decoded.signature, b"sig-bytes");
    }

    #[test]
    fn test_decode_token_signing_input_uses_original_segments() {
        let header = json!({"alg": "RS256", "kid": "abc"});
        let payload = json!({"sub": "u1"});
        let token = token_with(&header, &payload, b"s");

        let decoded = decode_token::<Value>(&token).unwrap();
        let expected = format!("{}.{}", segment(&header), segment(&payload));

        assert_eq!(decoded.signing_input(), expected);
        assert!(token.starts_with(&decoded.signing_input()));
    }

    #[test]
    fn test_decode_token_header_fields_default_to_empty() {
        let token = token_with(&json!({}), &json!({}), b"s");

        let decoded = decode_token::<Value>(&token).unwrap();
        assert_eq!(decoded.header, TokenHeader::default());
        assert!(decoded.header.kid.is_empty());
    }

    #[test]
    fn test_decode_token_wrong_segment_count() {
        assert_eq!(
            decode_token::<Value>("only.two").unwrap_err(),
            TokenError::MalformedToken
        );
        assert_eq!(
            decode_token::<Value>("a.b.c.d").unwrap_err(),
            TokenError::MalformedToken
        );
        assert_eq!(
            decode_token::<Value>("single").unwrap_err(),
            TokenError::MalformedToken
        );
        assert_eq!(
            decode_token::<Value>("").unwrap_err(),
            TokenError::MalformedToken
        );
    }

    #[test]
    fn test_decode_token_invalid_base64() {
        let result = decode_token::<Value>("!!!invalid!!!.e30.c2ln");
        assert_eq!(result.unwrap_err(), TokenError::MalformedToken);
    }

    #[test]
    fn test_decode_token_invalid_header_json() {
        let token = format!("{}.e30.c2ln", encode_base64url(b"not json"));
        assert_eq!(
            decode_token::<Value>(&token).unwrap_err(),
            TokenError::MalformedToken
        );
    }

    #[test]
    fn test_decode_token_invalid_payload_json() {
        let token = format!(
            "{}.{}.c2ln",
            segment(&json!({"kid": "abc"})),
            encode_base64url(b"{broken")
        );
        assert_eq!(
            decode_token::<Value>(&token).unwrap_err(),
            TokenError::MalformedToken
        );
    }

    #[test]
    fn test_decode_token_non_string_kid_is_malformed() {
        let token = token_with(&json!({"kid": 12345}), &json!({}), b"s");
        assert_eq!(
            decode_token::<Value>(&token).unwrap_err(),
            TokenError::MalformedToken
        );
    }

    #[test]
    fn test_decode_token_signature_is_not_json_decoded() {
        // Binary signature bytes that are not UTF-8 or JSON
        let token = token_with(&json!({"kid": "k"}), &json!({}), &[0xff, 0x00, 0x81]);
        let decoded = decode_token::<Value>(&token).unwrap();
        assert_eq!(decoded.signature, vec![0xff, 0x00, 0x81]);
    }

    #[test]
    fn test_decode_token_oversized() {
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(
            decode_token::<Value>(&oversized).unwrap_err(),
            TokenError::MalformedToken
        );
    }

    #[test]
    fn test_decode_token_typed_claims_type_mismatch() {
        #[derive(Deserialize)]
        #[allow(dead_code)]
        struct Typed {
            exp: i64,
        }

        let token = token_with(&json!({"kid": "k"}), &json!({"exp": "soon"}), b"s");
        assert!(matches!(
            decode_token::<Typed>(&token),
            Err(TokenError::MalformedToken)
        ));
    }

    // -------------------------------------------------------------------------
    // validate_iat_at Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_validate_iat_at_boundary_exact() {
        let now = 1_700_000_000_i64;

        // iat == now + skew is the last accepted value
        assert!(validate_iat_at(Some(now + 300), DEFAULT_CLOCK_SKEW, now).is_ok());

        // iat == now + skew + 1 is the first rejected value
        assert_eq!(
            validate_iat_at(Some(now + 301), DEFAULT_CLOCK_SKEW, now),
            Err(TokenError::TokenNotYetValid)
        );
    }

    #[test]
    fn test_validate_iat_at_past_time() {
        let now = 1_700_000_000_i64;
        assert!(validate_iat_at(Some(now - 3600), DEFAULT_CLOCK_SKEW, now).is_ok());
    }

    #[test]
    fn test_validate_iat_at_missing() {
        assert_eq!(
            validate_iat_at(None, DEFAULT_CLOCK_SKEW, 1_700_000_000),
            Err(TokenError::TokenNotYetValid)
        );
    }

    #[test]
    fn test_validate_iat_at_does_not_overflow() {
        assert!(validate_iat_at(Some(i64::MAX), DEFAULT_CLOCK_SKEW, i64::MAX - 10).is_ok());
    }
}
