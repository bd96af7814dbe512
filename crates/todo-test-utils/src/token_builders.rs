//! Builder patterns for test tokens
//!
//! Produces Firebase-style ID tokens signed with RS256 using the fixture
//! keys.

use crate::crypto_fixtures::{PRIMARY_KID, RSA_KEY_PRIMARY};
use chrono::{Duration, Utc};
use common::jwt::{encode_base64url, FIREBASE_ISSUER_PREFIX};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for Firebase ID tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new("proj1")
///     .for_user("u1")
///     .with_email("a@b.com")
///     .expires_in(3600)
///     .sign_primary();
/// ```
pub struct TestTokenBuilder {
    kid: Option<String>,
    sub: String,
    email: Option<String>,
    name: Option<String>,
    aud: String,
    iss: String,
    exp: Option<i64>,
    iat: Option<i64>,
}

impl TestTokenBuilder {
    /// Create a builder for a valid token for `project_id`
    pub fn new(project_id: &str) -> Self {
        let now = Utc::now();
        Self {
            kid: Some(PRIMARY_KID.to_string()),
            sub: "test-user".to_string(),
            email: Some("test@example.com".to_string()),
            name: None,
            aud: project_id.to_string(),
            iss: format!("{FIREBASE_ISSUER_PREFIX}{project_id}"),
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            iat: Some(now.timestamp()),
        }
    }

    /// Set the header key ID
    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    /// Omit the header key ID
    pub fn without_kid(mut self) -> Self {
        self.kid = None;
        self
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the email claim
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Omit the email claim
    pub fn without_email(mut self) -> Self {
        self.email = None;
        self
    }

    /// Set the display name claim
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Override the audience (defaults to the project ID)
    pub fn with_audience(mut self, aud: &str) -> Self {
        self.aud = aud.to_string();
        self
    }

    /// Override the issuer (defaults to the project's Firebase issuer)
    pub fn with_issuer(mut self, iss: &str) -> Self {
        self.iss = iss.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Set expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = Some(timestamp);
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = Some(timestamp);
        self
    }

    /// Omit the issued-at claim
    pub fn without_issued_at(mut self) -> Self {
        self.iat = None;
        self
    }

    /// Build the claims as a JSON value
    pub fn claims(&self) -> Value {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!(self.sub));
        claims.insert("aud".to_string(), json!(self.aud));
        claims.insert("iss".to_string(), json!(self.iss));
        if let Some(email) = &self.email {
            claims.insert("email".to_string(), json!(email));
        }
        if let Some(name) = &self.name {
            claims.insert("name".to_string(), json!(name));
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        if let Some(iat) = self.iat {
            claims.insert("iat".to_string(), json!(iat));
        }
        Value::Object(claims)
    }

    /// Sign with an RS256 PKCS#1 private key PEM
    pub fn sign(&self, private_key_pem: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.kid.clone();

        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .expect("fixture private key should parse");
        encode(&header, &self.claims(), &key).expect("test token should sign")
    }

    /// Sign with the primary fixture key
    pub fn sign_primary(&self) -> String {
        self.sign(RSA_KEY_PRIMARY)
    }

    /// Assemble a token with an arbitrary signature segment
    pub fn with_raw_signature(&self, signature: &[u8]) -> String {
        let mut header = json!({"alg": "RS256", "typ": "JWT"});
        if let Some(kid) = &self.kid {
            header["kid"] = json!(kid);
        }
        format!(
            "{}.{}.{}",
            encode_base64url(header.to_string().as_bytes()),
            encode_base64url(self.claims().to_string().as_bytes()),
            encode_base64url(signature)
        )
    }
}
