use anyhow::anyhow;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;

use crate::errors::{ApiError, ExceptionFilter, Failure, FailureSlot};

/// Renders every failure raised below this layer through the filter.
///
/// Handlers (and extractors) return [`Failure`]; its response carries the
/// failure in a [`FailureSlot`] extension, which is taken out here and
/// replaced by the filter's response. The router's own empty 405 for a
/// known path with the wrong method is rendered through the filter as well.
pub async fn exception_filter(
    State(filter): State<ExceptionFilter>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<FailureSlot>() {
        Some(FailureSlot(failure)) => filter.handle(&failure),
        None if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
            let mut rendered = filter.handle(&method_not_allowed());
            if let Some(allow) = response.headers().get(header::ALLOW) {
                rendered.headers_mut().insert(header::ALLOW, allow.clone());
            }
            rendered
        }
        None => response,
    }
}

fn method_not_allowed() -> Failure {
    ApiError::custom(
        "method_not_allowed",
        "Method not allowed",
        StatusCode::METHOD_NOT_ALLOWED,
    )
    .into()
}

/// Panic handler for `CatchPanicLayer`: turns a panic into an unexpected failure
pub fn panic_to_failure(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    Failure::from(anyhow!("handler panicked: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorSink, ValidationErrors};
    use axum::{body::Body, middleware, routing::get, Router};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingSink(Mutex<usize>);

    impl ErrorSink for CountingSink {
        fn record(&self, _failure: &Failure) {
            *self.0.lock().unwrap() += 1;
        }
    }

    async fn invalid() -> Result<&'static str, Failure> {
        Err(ValidationErrors::new().with("email", "can't be blank").into())
    }

    async fn ok() -> Result<&'static str, Failure> {
        Ok("fine")
    }

    fn app(sink: Arc<CountingSink>) -> Router {
        let filter = ExceptionFilter::new(false).with_sink(sink);
        Router::new()
            .route("/invalid", get(invalid))
            .route("/ok", get(ok))
            .layer(middleware::from_fn_with_state(filter, exception_filter))
    }

    #[tokio::test]
    async fn test_failure_is_rendered_and_logged_once() {
        let sink = Arc::new(CountingSink::default());
        let response = app(sink.clone())
            .oneshot(axum::http::Request::builder().uri("/invalid").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.extensions().get::<FailureSlot>().is_none());
        assert_eq!(*sink.0.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_success_passes_through_without_logging() {
        let sink = Arc::new(CountingSink::default());
        let response = app(sink.clone())
            .oneshot(axum::http::Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*sink.0.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_method_is_rendered_as_json_error() {
        let sink = Arc::new(CountingSink::default());
        let response = app(sink.clone())
            .oneshot(
                axum::http::Request::builder()
                    .method("DELETE")
                    .uri("/ok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "method_not_allowed");
        assert_eq!(*sink.0.lock().unwrap(), 1);
    }

    #[test]
    fn test_panic_payloads_become_unexpected_failures() {
        let response = panic_to_failure(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let slot = response.extensions().get::<FailureSlot>().unwrap();
        assert_eq!(slot.0.to_string(), "handler panicked: boom");

        let response = panic_to_failure(Box::new(String::from("kaboom")));
        let slot = response.extensions().get::<FailureSlot>().unwrap();
        assert_eq!(slot.0.to_string(), "handler panicked: kaboom");
    }
}
