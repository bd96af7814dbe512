//! Common utilities and types shared across the Todo API crates.

#![warn(clippy::pedantic)]

/// Module for compact token decoding, rejection kinds, and claim-time helpers
pub mod jwt;
