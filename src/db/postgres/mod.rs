pub mod connection;
pub mod queries;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::backend::{DatabaseBackend, PersistenceError};
use crate::models::user::User;

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseBackend for PostgresBackend {
    async fn insert_user(&self, user: &User) -> Result<(), PersistenceError> {
        queries::insert_user(&self.pool, user).await
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        queries::get_user_by_id(&self.pool, id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        queries::get_user_by_email(&self.pool, email).await
    }

    async fn record_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        queries::record_sign_in(&self.pool, id, at).await
    }

    async fn record_failed_attempt(&self, id: Uuid) -> Result<i32> {
        queries::record_failed_attempt(&self.pool, id).await
    }

    async fn count_users(&self) -> Result<i64> {
        queries::count_users(&self.pool).await
    }

    async fn test_connection(&self) -> Result<()> {
        connection::test_connection(&self.pool).await
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
