use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::extract::{require, PathParam, Payload};
use crate::config::Environment;
use crate::errors::{ApiError, Failure};
use crate::models::user::{NewUser, User};
use crate::users::UserService;

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub users: UserService,
    pub environment: Environment,
    pub instance_id: String,
}

/// Registration request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegistrationRequest {
    /// Required
    pub user: Option<NewUser>,
}

/// Sign-in credentials
#[derive(Debug, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// No fields submitted at all
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

/// Sign-in request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    /// Required
    pub user: Option<Credentials>,
}

/// User statistics
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of registered users
    pub users_total: i64,
    /// Instance that served the request
    pub instance_id: String,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = serde_json::Value)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "user-api",
        "version": env!("CARGO_PKG_VERSION"),
        "instance_id": state.instance_id,
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
        },
        "environment": format!("{:?}", state.environment).to_lowercase(),
        "uptime_seconds": START_TIME.elapsed().as_secs(),
    }))
}

/// Liveness probe
pub async fn health_live(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "service": "user-api",
        "instance_id": state.instance_id,
    }))
}

/// Readiness probe; checks the database
pub async fn health_ready(State(state): State<AppState>) -> Result<impl IntoResponse, Failure> {
    state
        .users
        .database()
        .test_connection()
        .await
        .map_err(|e| {
            e.context(ApiError::custom(
                "service_unavailable",
                "Database unavailable",
                StatusCode::SERVICE_UNAVAILABLE,
            ))
        })?;

    Ok(Json(serde_json::json!({
        "status": "ready",
        "checks": { "database": "ok" },
    })))
}

/// Register a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "The `user` parameter is missing", body = ApiError),
        (status = 422, description = "Validation failed", body = ApiError)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Payload(request): Payload<RegistrationRequest>,
) -> Result<impl IntoResponse, Failure> {
    // `{"user": {}}` counts as missing
    let new_user = request
        .user
        .filter(|user| !user.is_empty())
        .ok_or_else(|| Failure::param_missing("user"))?;
    info!("Registration request");

    let user = state.users.register(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User UUID")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found", body = ApiError)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<Json<User>, Failure> {
    info!("Get user request: id={}", id);

    // A malformed id can't match any record
    let id = Uuid::parse_str(&id).map_err(|_| Failure::not_found("User"))?;
    let user = state.users.find(id).await?;
    Ok(Json(user))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/users/sign_in",
    tag = "users",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = User),
        (status = 400, description = "A required parameter is missing", body = ApiError),
        (status = 401, description = "Bad credentials or locked account", body = ApiError)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Payload(request): Payload<SignInRequest>,
) -> Result<Json<User>, Failure> {
    let credentials = request
        .user
        .filter(|user| !user.is_empty())
        .ok_or_else(|| Failure::param_missing("user"))?;
    let email = require(credentials.email, "email")?;
    let password = require(credentials.password, "password")?;

    let user = state.users.authenticate(&email, &password).await?;
    Ok(Json(user))
}

/// User statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "statistics",
    responses(
        (status = 200, description = "User statistics", body = StatsResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, Failure> {
    let users_total = state.users.count().await?;
    Ok(Json(StatsResponse {
        users_total,
        instance_id: state.instance_id.clone(),
    }))
}

/// Fallback for unmatched routes
pub async fn route_not_found() -> Failure {
    Failure::not_found("route")
}
