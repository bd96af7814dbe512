//! Token verification integration tests.
//!
//! Runs the full verification pipeline against real RSA certificates and
//! RS256-signed tokens, with the key set supplied in memory.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use common::jwt::{decode_base64url, encode_base64url, TokenError};
use std::sync::Arc;
use todo_api::auth::certs::mock::{FailingKeySetFetcher, StaticKeySetFetcher};
use todo_api::auth::der::extract_spki;
use todo_api::auth::{ClaimPolicy, KeySet, TokenVerifier};
use todo_test_utils::*;

const PROJECT: &str = "proj1";

fn key_set(entries: &[(&str, &str)]) -> KeySet {
    entries.iter().copied().collect()
}

fn verifier(key_set: KeySet) -> (TokenVerifier, Arc<StaticKeySetFetcher>) {
    let fetcher = Arc::new(StaticKeySetFetcher::new(key_set));
    let verifier = TokenVerifier::new(fetcher.clone(), ClaimPolicy::new(PROJECT));
    (verifier, fetcher)
}

// -----------------------------------------------------------------------------
// Concrete scenarios
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_valid_token_yields_identity() {
    let (verifier, fetcher) = verifier(key_set(&[("abc", RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT)
        .with_kid("abc")
        .for_user("u1")
        .with_email("a@b.com")
        .sign_primary();

    let identity = verifier.verify(&token).await.unwrap();

    assert_eq!(identity.id, "u1");
    assert_eq!(identity.email, "a@b.com");
    assert_eq!(identity.display_name, "a@b.com");
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_unknown_kid_is_key_not_found() {
    let (verifier, _) = verifier(key_set(&[("abc", RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT)
        .with_kid("xyz")
        .for_user("u1")
        .sign_primary();

    assert_eq!(verifier.verify(&token).await, Err(TokenError::KeyNotFound));
}

#[tokio::test]
async fn test_missing_kid_is_key_not_found() {
    let (verifier, _) = verifier(key_set(&[("abc", RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT).without_kid().sign_primary();

    assert_eq!(verifier.verify(&token).await, Err(TokenError::KeyNotFound));
}

#[tokio::test]
async fn test_display_name_prefers_name_claim() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT)
        .with_name("Ada Lovelace")
        .sign_primary();

    let identity = verifier.verify(&token).await.unwrap();
    assert_eq!(identity.display_name, "Ada Lovelace");
}

#[tokio::test]
async fn test_identity_without_email() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT)
        .without_email()
        .sign_primary();

    let identity = verifier.verify(&token).await.unwrap();
    assert_eq!(identity.email, "");
    assert_eq!(identity.display_name, "Unknown User");
}

// -----------------------------------------------------------------------------
// Claim rejections happen before any fetch
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_expired_token_rejected_regardless_of_signature() {
    let (verifier, fetcher) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let builder = TestTokenBuilder::new(PROJECT).expires_in(-60);

    assert_eq!(
        verifier.verify(&builder.sign_primary()).await,
        Err(TokenError::TokenExpired)
    );
    assert_eq!(
        verifier.verify(&builder.with_raw_signature(b"junk")).await,
        Err(TokenError::TokenExpired)
    );
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_audience_mismatch_rejected_without_fetch() {
    let (verifier, fetcher) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new("other-project").sign_primary();

    assert_eq!(
        verifier.verify(&token).await,
        Err(TokenError::InvalidAudience)
    );
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_issuer_mismatch() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT)
        .with_issuer("https://securetoken.google.com/other-project")
        .sign_primary();

    assert_eq!(
        verifier.verify(&token).await,
        Err(TokenError::InvalidIssuer)
    );
}

#[tokio::test]
async fn test_empty_subject() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT).for_user("").sign_primary();

    assert_eq!(
        verifier.verify(&token).await,
        Err(TokenError::MissingSubject)
    );
}

#[tokio::test]
async fn test_issued_in_future_beyond_skew() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let future = common::jwt::now_epoch_seconds() + 3600;
    let token = TestTokenBuilder::new(PROJECT)
        .issued_at(future)
        .expires_at(future + 3600)
        .sign_primary();

    assert_eq!(
        verifier.verify(&token).await,
        Err(TokenError::TokenNotYetValid)
    );
}

#[tokio::test]
async fn test_verify_at_uses_supplied_clock() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT)
        .issued_at(1_000)
        .expires_at(2_000)
        .sign_primary();

    assert!(verifier.verify_at(&token, 1_500).await.is_ok());
    assert_eq!(
        verifier.verify_at(&token, 2_000).await,
        Err(TokenError::TokenExpired)
    );
    assert_eq!(
        verifier.verify_at(&token, 600).await,
        Err(TokenError::TokenNotYetValid)
    );
}

// -----------------------------------------------------------------------------
// Key and signature failures
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_tampered_signature() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT).sign_primary();

    let parts: Vec<&str> = token.split('.').collect();
    let mut signature = decode_base64url(parts[2]).unwrap();
    signature[10] ^= 0xff;
    let forged_signature = encode_base64url(&signature);
    let tampered = format!("{}.{}.{forged_signature}", parts[0], parts[1]);

    assert_eq!(
        verifier.verify(&tampered).await,
        Err(TokenError::SignatureInvalid)
    );
}

#[tokio::test]
async fn test_signed_by_other_key() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT).sign(RSA_KEY_SECONDARY);

    assert_eq!(
        verifier.verify(&token).await,
        Err(TokenError::SignatureInvalid)
    );
}

#[tokio::test]
async fn test_secondary_kid_verifies_with_secondary_key() {
    let (verifier, _) = verifier(key_set(&[
        (PRIMARY_KID, RSA_CERT_PRIMARY),
        (SECONDARY_KID, RSA_CERT_SECONDARY),
    ]));
    let token = TestTokenBuilder::new(PROJECT)
        .with_kid(SECONDARY_KID)
        .sign(RSA_KEY_SECONDARY);

    assert!(verifier.verify(&token).await.is_ok());
}

#[tokio::test]
async fn test_ec_certificate_is_extraction_error() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, EC_CERT)]));
    let token = TestTokenBuilder::new(PROJECT).sign_primary();

    assert!(matches!(
        verifier.verify(&token).await,
        Err(TokenError::KeyExtractionError(_))
    ));
}

#[tokio::test]
async fn test_key_fetch_failure() {
    let fetcher = Arc::new(FailingKeySetFetcher::new());
    let verifier = TokenVerifier::new(fetcher.clone(), ClaimPolicy::new(PROJECT));
    let token = TestTokenBuilder::new(PROJECT).sign_primary();

    assert_eq!(
        verifier.verify(&token).await,
        Err(TokenError::KeyFetchError)
    );
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_rejections_display_generic_message() {
    let (verifier, _) = verifier(key_set(&[(PRIMARY_KID, RSA_CERT_PRIMARY)]));
    let token = TestTokenBuilder::new(PROJECT).sign(RSA_KEY_SECONDARY);

    let err = verifier.verify(&token).await.unwrap_err();
    assert_eq!(err.to_string(), "authentication failed");
}

// -----------------------------------------------------------------------------
// Certificate key extraction
// -----------------------------------------------------------------------------

#[test]
fn test_extracted_spki_matches_certificate_public_key() {
    let spki = extract_spki(RSA_CERT_PRIMARY).unwrap();
    assert_eq!(spki.as_bytes(), pem_body_der(RSA_SPKI_PRIMARY).as_slice());
}

#[test]
fn test_extraction_is_deterministic() {
    let first = extract_spki(RSA_CERT_PRIMARY).unwrap();
    let second = extract_spki(RSA_CERT_PRIMARY).unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn test_distinct_certificates_yield_distinct_keys() {
    let primary = extract_spki(RSA_CERT_PRIMARY).unwrap();
    let secondary = extract_spki(RSA_CERT_SECONDARY).unwrap();
    assert_ne!(primary.as_bytes(), secondary.as_bytes());
}
