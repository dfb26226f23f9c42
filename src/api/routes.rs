use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    create_user, get_stats, get_user, health, health_live, health_ready, route_not_found,
    sign_in, AppState,
};
use super::middleware::{exception_filter, logging_middleware, panic_to_failure};
use super::openapi::ApiDoc;
use crate::errors::ExceptionFilter;
use crate::metrics;

pub fn create_router(state: AppState, filter: ExceptionFilter) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        // Users
        .route("/users", post(create_user))
        .route("/users/sign_in", post(sign_in))
        .route("/users/:id", get(get_user))
        // Stats endpoint
        .route("/stats", get(get_stats))
        // Metrics endpoint (Prometheus)
        .route("/metrics", get(metrics::metrics_handler))
        // OpenAPI documentation
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        // Order matters: panics become failures before the filter sees the response,
        // and logging/metrics record the filter's final status.
        .layer(CatchPanicLayer::custom(panic_to_failure))
        .layer(middleware::from_fn_with_state(filter, exception_filter))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics::middleware::track_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Add shared state
        .with_state(state)
}
