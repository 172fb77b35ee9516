//! Request logging

use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::info;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Logs method, path, status and latency, and reports the latency in
/// seconds as `x-process-time`.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let mut response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_secs = elapsed,
        "request handled"
    );

    if let Ok(value) = HeaderValue::from_str(&format!("{:.6}", elapsed)) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}
