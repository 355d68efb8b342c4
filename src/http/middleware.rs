//! HTTP middleware
//!
//! Additional middleware for the HTTP server.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

pub static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request logging middleware. Tags each request with a fresh id, returned
/// in the `x-request-id` header.
pub async fn request_logger(request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let span = tracing::info_span!("request", id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    // The query string is left out: proxy targets can carry signed URLs.
    if status.is_success() || status.is_redirection() {
        info!(request_id = %request_id, "{} {} {} in {:?}", method, path, status, duration);
    } else {
        warn!(request_id = %request_id, "{} {} {} in {:?}", method, path, status, duration);
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID.clone(), value);
    }
    response
}
