use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};

use crate::errors::{ApiError, Failure};

/// JSON body extractor whose rejections go through the exception filter
/// as `invalid_payload` errors instead of axum's plain-text responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::custom(
                "invalid_payload",
                rejection.body_text(),
                rejection.status(),
            )
            .into()),
        }
    }
}

/// Path parameter extractor; undecodable segments become `invalid_path`
/// errors instead of axum's plain-text rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParam<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParam<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::custom(
                "invalid_path",
                rejection.body_text(),
                rejection.status(),
            )
            .into()),
        }
    }
}

/// Value of a required parameter; absent or empty is `param_missing`
pub fn require<T>(value: Option<T>, name: &str) -> Result<T, Failure>
where
    T: AsRef<str>,
{
    match value {
        Some(value) if !value.as_ref().is_empty() => Ok(value),
        _ => Err(Failure::param_missing(name)),
    }
}
