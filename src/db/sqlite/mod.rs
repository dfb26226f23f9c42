pub mod connection;
pub mod queries;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::backend::{DatabaseBackend, PersistenceError};
use crate::db::sqlite::connection::SqlitePool;
use crate::models::user::User;

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Result<Self> {
        // Initialize schema on creation
        connection::init_schema(&pool)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseBackend for SqliteBackend {
    async fn insert_user(&self, user: &User) -> Result<(), PersistenceError> {
        let pool = self.pool.clone();
        let user = user.clone(); // Clone to move into spawn_blocking
        tokio::task::spawn_blocking(move || queries::insert_user(&pool, &user))
            .await
            .map_err(anyhow::Error::from)?
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || queries::get_user_by_id(&pool, id)).await?
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let email = email.to_string();
        tokio::task::spawn_blocking(move || queries::get_user_by_email(&pool, &email)).await?
    }

    async fn record_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || queries::record_sign_in(&pool, id, at)).await?
    }

    async fn record_failed_attempt(&self, id: Uuid) -> Result<i32> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || queries::record_failed_attempt(&pool, id)).await?
    }

    async fn count_users(&self) -> Result<i64> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || queries::count_users(&pool)).await?
    }

    async fn test_connection(&self) -> Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || connection::test_connection(&pool)).await?
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
