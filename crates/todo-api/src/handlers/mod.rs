//! HTTP request handlers for the Todo API.

pub mod auth;
pub mod health;
pub mod metrics;

pub use auth::{get_me, logout};
pub use health::{health_check, service_info};
pub use metrics::metrics_handler;
