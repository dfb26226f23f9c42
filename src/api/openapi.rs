use utoipa::OpenApi;

use crate::api::handlers::{Credentials, RegistrationRequest, SignInRequest, StatsResponse};
use crate::errors::ApiError;
use crate::models::user::{NewUser, User};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User API",
        version = "0.1.0",
        description = "User registration and password sign-in. Every failure is returned as a JSON error object with a stable `code`, a `message` and, for validation failures, per-field `errors`.",
        contact(
            name = "User API",
        )
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::create_user,
        crate::api::handlers::get_user,
        crate::api::handlers::sign_in,
        crate::api::handlers::get_stats,
    ),
    components(
        schemas(
            User,
            NewUser,
            Credentials,
            RegistrationRequest,
            SignInRequest,
            StatsResponse,
            ApiError,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Registration and sign-in"),
        (name = "statistics", description = "User statistics"),
    )
)]
pub struct ApiDoc;
