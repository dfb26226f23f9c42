use axum::http::StatusCode;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Error codes for structured API responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unexpected failure
    InternalServerError,

    /// Authentication failed
    NotAuthorized,

    /// Referenced resource does not exist
    NotFound,

    /// Required request parameter missing or empty
    ParamMissing,

    /// Entity failed field-level validation
    RecordInvalid,

    /// Application-defined code outside the built-in set
    Custom(Cow<'static, str>),
}

impl ErrorCode {
    pub fn custom(code: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom(code.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::InternalServerError => "internal_server_error",
            Self::NotAuthorized => "not_authorized",
            Self::NotFound => "not_found",
            Self::ParamMissing => "param_missing",
            Self::RecordInvalid => "record_invalid",
            Self::Custom(code) => code,
        }
    }

    /// Get HTTP status code for this error.
    ///
    /// Custom codes have no inherent status; they fall back to 500 unless the
    /// error carrying them says otherwise.
    pub fn default_status(&self) -> StatusCode {
        match self {
            Self::ParamMissing => StatusCode::BAD_REQUEST,
            Self::NotAuthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RecordInvalid => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalServerError | Self::Custom(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_codes_render_snake_case() {
        assert_eq!(ErrorCode::InternalServerError.to_string(), "internal_server_error");
        assert_eq!(ErrorCode::NotAuthorized.to_string(), "not_authorized");
        assert_eq!(ErrorCode::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCode::ParamMissing.to_string(), "param_missing");
        assert_eq!(ErrorCode::RecordInvalid.to_string(), "record_invalid");
    }

    #[test]
    fn test_custom_code_keeps_its_name() {
        let code = ErrorCode::custom("temp_error");
        assert_eq!(code.as_str(), "temp_error");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"temp_error\"");
    }

    #[test]
    fn test_error_code_status_codes() {
        assert_eq!(ErrorCode::ParamMissing.default_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotAuthorized.default_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::NotFound.default_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::RecordInvalid.default_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::InternalServerError.default_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
