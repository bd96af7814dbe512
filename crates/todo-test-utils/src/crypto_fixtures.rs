//! Fixed certificate and key fixtures.
//!
//! The RSA certificates are self-signed 2048-bit X.509 certificates shaped
//! like the ones Google publishes for Firebase. Each has a matching PKCS#1
//! private key for signing test tokens.

/// Primary RSA signing certificate.
pub const RSA_CERT_PRIMARY: &str = include_str!("../fixtures/rsa_cert_primary.pem");

/// Private key matching [`RSA_CERT_PRIMARY`].
pub const RSA_KEY_PRIMARY: &str = include_str!("../fixtures/rsa_key_primary.pem");

/// A second, unrelated RSA certificate.
pub const RSA_CERT_SECONDARY: &str = include_str!("../fixtures/rsa_cert_secondary.pem");

/// Private key matching [`RSA_CERT_SECONDARY`].
pub const RSA_KEY_SECONDARY: &str = include_str!("../fixtures/rsa_key_secondary.pem");

/// The SubjectPublicKeyInfo of [`RSA_CERT_PRIMARY`] as a `PUBLIC KEY` PEM.
pub const RSA_SPKI_PRIMARY: &str = include_str!("../fixtures/rsa_spki_primary.pem");

/// A P-256 certificate. It carries no RSA key.
pub const EC_CERT: &str = include_str!("../fixtures/ec_cert.pem");

/// Key ID under which the primary certificate is published.
pub const PRIMARY_KID: &str = "primary-kid";

/// Key ID under which the secondary certificate is published.
pub const SECONDARY_KID: &str = "secondary-kid";

/// Key set JSON as served by the certificate endpoint.
pub fn test_key_set_json() -> serde_json::Value {
    serde_json::json!({
        PRIMARY_KID: RSA_CERT_PRIMARY,
        SECONDARY_KID: RSA_CERT_SECONDARY,
    })
}

/// DER bytes of a PEM document with a single block.
pub fn pem_body_der(pem: &str) -> Vec<u8> {
    use base64::Engine;

    let body: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(body)
        .expect("fixture PEM body should be valid base64")
}
