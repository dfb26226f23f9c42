use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::backend::{DatabaseBackend, PersistenceError};
use crate::models::user::User;

/// Process-local storage, selected with `DATABASE_URL=memory://`.
///
/// Data is lost on restart; used by tests and local development.
#[derive(Default)]
pub struct MemoryBackend {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseBackend for MemoryBackend {
    async fn insert_user(&self, user: &User) -> Result<(), PersistenceError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(PersistenceError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn record_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .with_context(|| format!("User {} vanished before sign-in was recorded", id))?;
        user.failed_attempts = 0;
        user.last_sign_in_at = Some(at);
        user.updated_at = at;
        Ok(())
    }

    async fn record_failed_attempt(&self, id: Uuid) -> Result<i32> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .with_context(|| format!("User {} vanished before failed attempt was recorded", id))?;
        user.failed_attempts += 1;
        user.updated_at = Utc::now();
        Ok(user.failed_attempts)
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
