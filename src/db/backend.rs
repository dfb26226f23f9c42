use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::User;

/// Failure modes of a write that callers need to tell apart
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("email has already been taken")]
    DuplicateEmail,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Database backend trait for abstracting PostgreSQL, SQLite and in-memory storage
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Insert a new user. Emails are unique.
    async fn insert_user(&self, user: &User) -> Result<(), PersistenceError>;

    /// Get a user by ID
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Get a user by (normalized) email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Reset the failed-attempt counter and stamp the sign-in time
    async fn record_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// Increment the failed-attempt counter, returning the new value
    async fn record_failed_attempt(&self, id: Uuid) -> Result<i32>;

    /// Get the total count of users in the database
    async fn count_users(&self) -> Result<i64>;

    /// Test database connection
    async fn test_connection(&self) -> Result<()>;

    /// Return self as Any for downcasting
    fn as_any(&self) -> &dyn Any;
}
