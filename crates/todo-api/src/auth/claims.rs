//! ID token claims, claim policy, and the authenticated identity.
//!
//! The `sub` and `email` fields are redacted in Debug output to prevent
//! exposure in logs.

use common::jwt::{validate_iat_at, TokenError, DEFAULT_CLOCK_SKEW, FIREBASE_ISSUER_PREFIX};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Display name used when a token carries neither `name` nor `email`.
pub const UNKNOWN_USER_DISPLAY_NAME: &str = "Unknown User";

/// Claims carried in a Firebase ID token payload.
///
/// String claims default to empty when absent or `null` so that a missing
/// claim is reported by the validator as the matching rejection kind rather
/// than as a malformed token.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject (Firebase user ID) - redacted in Debug output.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sub: String,

    /// User email - redacted in Debug output.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,

    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Audience (Firebase project ID).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub aud: String,

    /// Issuer.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub iss: String,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

impl fmt::Debug for IdTokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdTokenClaims")
            .field("sub", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("aud", &self.aud)
            .field("iss", &self.iss)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .finish_non_exhaustive()
    }
}

/// What a token's claims must satisfy for this deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPolicy {
    audience: String,
    clock_skew: Duration,
}

impl ClaimPolicy {
    /// Policy for a Firebase project with the default clock skew.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            audience: project_id.into(),
            clock_skew: DEFAULT_CLOCK_SKEW,
        }
    }

    /// Override the `iat` clock skew tolerance.
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    /// Expected `aud` claim.
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Expected `iss` claim.
    pub fn expected_issuer(&self) -> String {
        format!("{FIREBASE_ISSUER_PREFIX}{}", self.audience)
    }

    /// Clock skew tolerance for `iat`.
    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }
}

/// Validate claims against `policy` at time `now`.
///
/// Checks run in a fixed order and stop at the first violation, so the
/// returned kind always names the first rule broken:
///
/// 1. `exp` present and after `now`
/// 2. `iat` present and no later than `now + clock_skew`
/// 3. `aud` equals the project ID
/// 4. `iss` equals `https://securetoken.google.com/<project ID>`
/// 5. `sub` non-empty
///
/// # Errors
///
/// Returns `TokenExpired`, `TokenNotYetValid`, `InvalidAudience`,
/// `InvalidIssuer` or `MissingSubject`.
pub fn validate_claims_at(
    claims: &IdTokenClaims,
    policy: &ClaimPolicy,
    now: i64,
) -> Result<(), TokenError> {
    match claims.exp {
        Some(exp) if exp > now => {}
        _ => return Err(TokenError::TokenExpired),
    }

    validate_iat_at(claims.iat, policy.clock_skew, now)?;

    if claims.aud != policy.audience {
        return Err(TokenError::InvalidAudience);
    }

    if claims.iss != policy.expected_issuer() {
        return Err(TokenError::InvalidIssuer);
    }

    if claims.sub.is_empty() {
        return Err(TokenError::MissingSubject);
    }

    Ok(())
}

/// The identity of a caller whose token verified.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    /// Firebase user ID (the token subject).
    pub id: String,

    /// Email address, empty if the token carried none.
    pub email: String,

    /// Name to show for this user.
    pub display_name: String,
}

impl fmt::Debug for AuthenticatedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedIdentity")
            .field("id", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("display_name", &"[REDACTED]")
            .finish()
    }
}

impl From<IdTokenClaims> for AuthenticatedIdentity {
    fn from(claims: IdTokenClaims) -> Self {
        let display_name = claims
            .name
            .filter(|name| !name.is_empty())
            .or_else(|| Some(claims.email.clone()).filter(|email| !email.is_empty()))
            .unwrap_or_else(|| UNKNOWN_USER_DISPLAY_NAME.to_string());

        Self {
            id: claims.sub,
            email: claims.email,
            display_name,
        }
    }
}
