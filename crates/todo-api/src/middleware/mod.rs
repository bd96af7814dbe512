//! Middleware for the Todo API.
//!
//! # Components
//!
//! - `auth` - Bearer token authentication for protected routes
//! - `request_id` - Per-request UUID tagging

pub mod auth;
pub mod request_id;

pub use auth::{require_auth, AuthState};
pub use request_id::{assign_request_id, RequestId, REQUEST_ID_HEADER};
