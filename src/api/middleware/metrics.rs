//! HTTP Metrics Middleware
//!
//! Writes one `webapp` point per request, tagged with the HTTP method and the
//! exact request path, carrying `count=1` and the handler duration in seconds.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

/// Middleware to record request count and duration for each request
pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();

    // Extract method and path before consuming the request
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    state
        .metrics
        .record_http_request(&method, &path, duration)
        .await;

    response
}
