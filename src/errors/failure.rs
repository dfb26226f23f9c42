use axum::response::{IntoResponse, Response};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::sync::Arc;
use thiserror::Error;

use super::response::ApiError;
use super::validation::ValidationErrors;

/// Anything a request handler can fail with.
///
/// Handlers return `Result<_, Failure>`; the exception filter is the only
/// place these get turned into client-visible responses.
#[derive(Debug, Error)]
pub enum Failure {
    /// A required request parameter is absent or empty
    #[error("param is missing or the value is empty: {0}")]
    ParamMissing(String),

    /// The referenced resource does not exist
    #[error("Couldn't find {0}")]
    NotFound(String),

    /// An entity failed validation
    #[error("Validation failed: {0}")]
    RecordInvalid(ValidationErrors),

    /// Already shaped as an API error
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl Failure {
    pub fn param_missing(param: impl Into<String>) -> Self {
        Self::ParamMissing(param.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Stack trace captured when the failure was created, if any.
    ///
    /// Only unexpected failures carry one, and only when capture is enabled
    /// (`RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`).
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            Self::Unexpected(err) => {
                let backtrace = err.backtrace();
                (backtrace.status() == BacktraceStatus::Captured).then_some(backtrace)
            }
            _ => None,
        }
    }
}

impl From<ValidationErrors> for Failure {
    fn from(errors: ValidationErrors) -> Self {
        Self::RecordInvalid(errors)
    }
}

/// Carries a failure from a handler to the exception filter middleware.
#[derive(Debug, Clone)]
pub struct FailureSlot(pub Arc<Failure>);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        // The filter replaces this response. The redacted rendering only
        // reaches clients if no filter is layered on the router.
        let mut response = super::filter::ExceptionFilter::default()
            .classify(&self)
            .into_response();
        response.extensions_mut().insert(FailureSlot(Arc::new(self)));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use axum::http::StatusCode;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Failure::param_missing("user").to_string(),
            "param is missing or the value is empty: user"
        );
        assert_eq!(Failure::not_found("User").to_string(), "Couldn't find User");
        let invalid: Failure = ValidationErrors::new().with("email", "can't be blank").into();
        assert_eq!(invalid.to_string(), "Validation failed: Email can't be blank");
        assert_eq!(Failure::from(anyhow!("boom")).to_string(), "boom");
    }

    #[test]
    fn test_known_failures_have_no_backtrace() {
        assert!(Failure::not_found("User").backtrace().is_none());
        assert!(Failure::from(ApiError::not_authorized()).backtrace().is_none());
    }

    #[test]
    fn test_into_response_attaches_failure_for_filter() {
        let response = Failure::not_found("User").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let slot = response.extensions().get::<FailureSlot>().unwrap();
        assert!(matches!(slot.0.as_ref(), Failure::NotFound(resource) if resource == "User"));
    }

    #[test]
    fn test_into_response_without_filter_is_redacted() {
        let response = Failure::from(anyhow!("secret connection string")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
