//! Observability module for the Todo API.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
