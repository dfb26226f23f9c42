use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;
use utoipa::ToSchema;

use super::codes::ErrorCode;
use super::validation::ValidationErrors;

pub const PARAM_MISSING_MESSAGE: &str = "Parameter missing";
pub const NOT_FOUND_MESSAGE: &str = "Resource not found";
pub const RECORD_INVALID_MESSAGE: &str = "Record invalid";
pub const NOT_AUTHORIZED_MESSAGE: &str = "Not authorized";
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Something went wrong";

/// Structured error response
///
/// Every error a client can observe is one of these. The body is
/// `{"code", "message", "errors"?}`; the status travels on the HTTP response.
#[derive(Debug, Clone, PartialEq, Error, Serialize, ToSchema)]
#[error("{message}")]
pub struct ApiError {
    /// Error code for programmatic handling
    #[schema(value_type = String, example = "record_invalid")]
    code: ErrorCode,
    /// Human-readable error message
    message: String,
    #[serde(skip)]
    status: StatusCode,
    /// Field-level violations, present only for validation failures
    #[serde(skip_serializing_if = "has_no_field_errors")]
    #[schema(value_type = Option<std::collections::HashMap<String, Vec<String>>>)]
    errors: Option<ValidationErrors>,
}

fn has_no_field_errors(errors: &Option<ValidationErrors>) -> bool {
    errors.as_ref().map_or(true, ValidationErrors::is_empty)
}

impl ApiError {
    /// Create a new error using the code's default status
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.default_status();
        Self {
            code,
            message: message.into(),
            status,
            errors: None,
        }
    }

    /// Application-defined error with its own code and status
    pub fn custom(
        code: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            code: ErrorCode::custom(code),
            message: message.into(),
            status,
            errors: None,
        }
    }

    /// Replace the default message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn errors(&self) -> Option<&ValidationErrors> {
        self.errors.as_ref().filter(|errors| !errors.is_empty())
    }

    /// JSON body sent to clients
    pub fn serialize(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "code": self.code.as_str(), "message": self.message })
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Helpers for the built-in errors
impl ApiError {
    pub fn param_missing(param: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::ParamMissing,
            format!("{}: {}", PARAM_MISSING_MESSAGE, param.as_ref()),
        )
    }

    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound, NOT_FOUND_MESSAGE)
    }

    pub fn record_invalid(errors: ValidationErrors) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(ErrorCode::RecordInvalid, RECORD_INVALID_MESSAGE)
        }
    }

    pub fn not_authorized() -> Self {
        Self::new(ErrorCode::NotAuthorized, NOT_AUTHORIZED_MESSAGE)
    }

    /// `None` keeps the redacted default message
    pub fn internal(message: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalServerError,
            message.unwrap_or_else(|| INTERNAL_SERVER_ERROR_MESSAGE.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_response_serialization() {
        let err = ApiError::not_found();
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"code":"not_found","message":"Resource not found"}"#);
    }

    #[test]
    fn test_param_missing_interpolates_name() {
        let err = ApiError::param_missing("test_param");
        assert_eq!(
            err.serialize(),
            json!({ "code": "param_missing", "message": "Parameter missing: test_param" })
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_record_invalid_includes_field_errors() {
        let errors = ValidationErrors::new().with("email", "can't be blank");
        let err = ApiError::record_invalid(errors);
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"code":"record_invalid","message":"Record invalid","errors":{"email":["can't be blank"]}}"#
        );
    }

    #[test]
    fn test_empty_field_errors_are_omitted() {
        let err = ApiError::record_invalid(ValidationErrors::new());
        let body = err.serialize();
        assert!(body.get("errors").is_none());
        assert!(err.errors().is_none());
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let err = ApiError::record_invalid(
            ValidationErrors::new()
                .with("email", "can't be blank")
                .with("password", "is too short (minimum is 6 characters)"),
        );
        let first = serde_json::to_string(&err).unwrap();
        let second = serde_json::to_string(&err).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_internal_message_defaults_to_redacted() {
        assert_eq!(ApiError::internal(None).message(), "Something went wrong");
        assert_eq!(
            ApiError::internal(Some("A test error".into())).message(),
            "A test error"
        );
    }

    #[test]
    fn test_with_message_keeps_code_and_status() {
        let err = ApiError::not_found().with_message("User not found");
        assert_eq!(err.code(), &ErrorCode::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "User not found");
    }

    // ========== HTTP STATUS CODE TESTS ==========

    #[test]
    fn test_into_response_status_param_missing() {
        let response = ApiError::param_missing("user").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_into_response_status_unauthorized() {
        let response = ApiError::not_authorized().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_into_response_status_not_found() {
        let response = ApiError::not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_into_response_status_unprocessable() {
        let response = ApiError::record_invalid(ValidationErrors::new()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_into_response_status_internal_error() {
        let response = ApiError::internal(None).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_status_custom() {
        let err = ApiError::custom("temp_error", "Temp error", StatusCode::BAD_GATEWAY);
        assert_eq!(err.code().as_str(), "temp_error");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
