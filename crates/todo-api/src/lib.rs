//! Todo API Service Library
//!
//! HTTP backend for the todo application. Callers authenticate with Firebase
//! ID tokens, which are verified locally against Google's published signing
//! certificates.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/*.rs -> handlers/*.rs
//!                      |
//!                      v
//!                auth/verifier.rs -> auth/{claims, certs, signature, der}.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Firebase ID token verification
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication and request ID middleware
//! - `observability` - Metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
