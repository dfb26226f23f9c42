pub mod middleware;
pub mod registry;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};

/// Handler for the /metrics endpoint
/// Returns metrics in Prometheus exposition format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => {
            let body = String::from_utf8(buffer).unwrap_or_default();
            (
                StatusCode::OK,
                [("Content-Type", encoder.format_type())],
                body,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

pub use registry::{
    API_ERRORS_TOTAL, DATABASE_QUERIES_TOTAL, DATABASE_QUERY_DURATION_SECONDS,
    HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS, SIGN_IN_ATTEMPTS_TOTAL, USERS_REGISTERED_TOTAL,
    USERS_TOTAL,
};
