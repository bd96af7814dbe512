//! # Todo Test Utilities
//!
//! Shared test utilities for the Todo API.
//!
//! This crate provides:
//! - Fixed RSA and EC certificate fixtures with matching private keys
//! - `TestTokenBuilder` for signed Firebase-style ID tokens
//! - `TestApiServer`, a real server wired to a mock certificate endpoint
//!
//! ## Usage
//!
//! ```rust,ignore
//! use todo_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestApiServer::spawn().await?;
//!     let token = TestTokenBuilder::new(TEST_PROJECT_ID).sign_primary();
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/auth/me", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
