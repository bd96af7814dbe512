//! Request ID middleware.
//!
//! Assigns a fresh UUID v4 to every request, makes it available to handlers
//! as a [`RequestId`] extension, records it on the request span, and echoes
//! it in the `x-request-id` response header.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use std::fmt;
use tracing::Instrument;
use uuid::Uuid;

/// Response header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random (v4) request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Middleware that tags each request with a new [`RequestId`].
///
/// Any `x-request-id` sent by the client is ignored.
pub async fn assign_request_id(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::new();
    req.extensions_mut().insert(request_id);

    let span = tracing::info_span!("request", request_id = %request_id);
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
