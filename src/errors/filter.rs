//! Translation of request failures into API error responses.
//!
//! Every failure is logged once through an [`ErrorSink`], classified into an
//! [`ApiError`] and rendered as exactly one JSON response.

use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::Arc;
use tracing::{error, warn};

use super::failure::Failure;
use super::response::ApiError;
use super::validation::ValidationErrors;
use crate::metrics::registry::API_ERRORS_TOTAL;

/// Destination for failures intercepted by the filter.
///
/// Implementations must not panic; the filter renders a response regardless
/// of what happens here.
pub trait ErrorSink: Send + Sync {
    fn record(&self, failure: &Failure);
}

/// Writes failures to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn record(&self, failure: &Failure) {
        match (failure, failure.backtrace()) {
            (Failure::Unexpected(err), Some(backtrace)) => {
                error!(error = ?err, backtrace = %backtrace, "Unhandled failure");
            }
            (Failure::Unexpected(err), None) => {
                error!(error = ?err, "Unhandled failure");
            }
            (Failure::Api(api), _) if api.status().is_server_error() => {
                error!(code = %api.code(), status = api.status().as_u16(), error = %api, "API error");
            }
            (Failure::Api(api), _) => {
                warn!(code = %api.code(), status = api.status().as_u16(), error = %api, "API error");
            }
            (other, _) => {
                warn!(error = %other, "Request failed");
            }
        }
    }
}

#[derive(Clone)]
pub struct ExceptionFilter {
    verbose_errors: bool,
    sink: Arc<dyn ErrorSink>,
}

impl fmt::Debug for ExceptionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionFilter")
            .field("verbose_errors", &self.verbose_errors)
            .finish_non_exhaustive()
    }
}

/// Redacted filter logging through `tracing`
impl Default for ExceptionFilter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ExceptionFilter {
    /// `verbose_errors` surfaces the message of unexpected failures to clients.
    /// Leave it off in production.
    pub fn new(verbose_errors: bool) -> Self {
        Self {
            verbose_errors,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn verbose_errors(&self) -> bool {
        self.verbose_errors
    }

    /// Map a failure onto the error taxonomy. Total: every failure has an outcome.
    pub fn classify(&self, failure: &Failure) -> ApiError {
        match failure {
            Failure::ParamMissing(param) => ApiError::param_missing(param),
            Failure::NotFound(_) => ApiError::not_found(),
            Failure::RecordInvalid(errors) => ApiError::record_invalid(errors.clone()),
            Failure::Api(api) => api.clone(),
            Failure::Unexpected(err) => {
                if let Some(api) = err.downcast_ref::<ApiError>() {
                    api.clone()
                } else if let Some(errors) = err.downcast_ref::<ValidationErrors>() {
                    ApiError::record_invalid(errors.clone())
                } else if self.verbose_errors {
                    ApiError::internal(Some(err.to_string()))
                } else {
                    ApiError::internal(None)
                }
            }
        }
    }

    /// Log, classify and render a failure
    pub fn handle(&self, failure: &Failure) -> Response {
        self.sink.record(failure);

        let api_error = self.classify(failure);
        API_ERRORS_TOTAL
            .with_label_values(&[api_error.code().as_str(), api_error.status().as_str()])
            .inc();

        api_error.into_response()
    }
}
