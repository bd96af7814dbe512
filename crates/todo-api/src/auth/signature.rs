//! RS256 signature verification against the fetched key set.

use crate::auth::certs::KeySet;
use crate::auth::der::{extract_spki, SubjectPublicKeyInfo};
use common::jwt::{DecodedToken, TokenError};
use ring::signature::{UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA256};

/// Verify the token's signature with the certificate named by its `kid`.
///
/// The algorithm is fixed to RSASSA-PKCS1-v1_5 with SHA-256; the header's
/// `alg` is not consulted. Returns `Ok(false)` when the key cannot be
/// imported or the signature does not verify.
///
/// # Errors
///
/// - `TokenError::KeyNotFound` if `kid` is not in `key_set`
/// - `TokenError::KeyExtractionError` if the certificate has no RSA key
pub fn verify_signature<C>(
    key_set: &KeySet,
    decoded: &DecodedToken<'_, C>,
) -> Result<bool, TokenError> {
    let pem = key_set
        .get(&decoded.header.kid)
        .ok_or(TokenError::KeyNotFound)?;

    let spki = extract_spki(pem)?;

    Ok(verify_rs256(
        &spki,
        decoded.signing_input().as_bytes(),
        &decoded.signature,
    ))
}

/// Check an RS256 signature over `message` with the key in `spki`.
pub fn verify_rs256(spki: &SubjectPublicKeyInfo, message: &[u8], signature: &[u8]) -> bool {
    let Some(rsa_public_key) = spki.rsa_public_key() else {
        return false;
    };

    UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, rsa_public_key)
        .verify(message, signature)
        .is_ok()
}
