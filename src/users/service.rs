use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::{Database, PersistenceError};
use crate::errors::{ApiError, Failure, ValidationErrors};
use crate::metrics::registry::{SIGN_IN_ATTEMPTS_TOTAL, USERS_REGISTERED_TOTAL, USERS_TOTAL};
use crate::models::user::{NewUser, User};

use super::password::{hash_password, verify_password};

pub struct UserService {
    db: Database,
    auth: AuthConfig,
}

impl UserService {
    pub fn new(db: Database, auth: AuthConfig) -> Self {
        Self { db, auth }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Validate and store a new user
    pub async fn register(&self, new_user: NewUser) -> Result<User, Failure> {
        new_user.validate()?;

        let email = new_user.normalized_email();
        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(email_taken().into());
        }

        let password = new_user.password.as_deref().unwrap_or_default();
        let encrypted_password = hash_password(password, self.auth.bcrypt_cost).await?;
        let user = User::new(email, encrypted_password);

        match self.db.insert_user(&user).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration
            Err(PersistenceError::DuplicateEmail) => return Err(email_taken().into()),
            Err(PersistenceError::Other(e)) => return Err(e.into()),
        }

        USERS_REGISTERED_TOTAL.inc();
        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    pub async fn find(&self, id: Uuid) -> Result<User, Failure> {
        debug!(user_id = %id, "Looking up user");
        self.db
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| Failure::not_found("User"))
    }

    /// Check credentials, tracking failed attempts.
    ///
    /// Unknown email, wrong password and locked account all produce the same
    /// `not_authorized` error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, Failure> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.db.get_user_by_email(&email).await? else {
            SIGN_IN_ATTEMPTS_TOTAL.with_label_values(&["bad_credentials"]).inc();
            return Err(ApiError::not_authorized().into());
        };

        if user.is_locked(self.auth.max_failed_attempts) {
            SIGN_IN_ATTEMPTS_TOTAL.with_label_values(&["locked"]).inc();
            warn!(user_id = %user.id, failed_attempts = user.failed_attempts, "Sign-in refused for locked account");
            return Err(ApiError::not_authorized().into());
        }

        if !verify_password(password, &user.encrypted_password).await? {
            let failed_attempts = self.db.record_failed_attempt(user.id).await?;
            SIGN_IN_ATTEMPTS_TOTAL.with_label_values(&["bad_credentials"]).inc();
            warn!(user_id = %user.id, failed_attempts, "Sign-in failed");
            return Err(ApiError::not_authorized().into());
        }

        let signed_in_at = Utc::now();
        self.db.record_sign_in(user.id, signed_in_at).await?;
        SIGN_IN_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
        info!(user_id = %user.id, "Signed in");

        Ok(User {
            failed_attempts: 0,
            last_sign_in_at: Some(signed_in_at),
            updated_at: signed_in_at,
            ..user
        })
    }

    pub async fn count(&self) -> Result<i64> {
        let count = self.db.count_users().await?;
        USERS_TOTAL.set(count);
        Ok(count)
    }
}

fn email_taken() -> ValidationErrors {
    ValidationErrors::new().with("email", "has already been taken")
}
