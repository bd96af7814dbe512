//! Firebase ID token authentication.
//!
//! # Components
//!
//! - `certs` - Signing-certificate key set and fetchers
//! - `claims` - Token claims, claim policy and the authenticated identity
//! - `der` - SubjectPublicKeyInfo extraction from PEM certificates
//! - `signature` - RS256 signature verification
//! - `verifier` - The verification pipeline

pub mod certs;
pub mod claims;
pub mod der;
pub mod signature;
pub mod verifier;

pub use certs::{HttpKeySetFetcher, KeySet, KeySetFetcher};
pub use claims::{AuthenticatedIdentity, ClaimPolicy, IdTokenClaims};
pub use verifier::TokenVerifier;
