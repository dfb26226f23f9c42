use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::time::Instant;
use uuid::Uuid;

use crate::db::backend::PersistenceError;
use crate::db::{Database, DatabaseBackend};
use crate::metrics::registry::{DATABASE_QUERIES_TOTAL, DATABASE_QUERY_DURATION_SECONDS};
use crate::models::user::User;

/// A thin wrapper around a DatabaseBackend that records basic Prometheus metrics
/// for query counts and durations.
pub struct InstrumentedDatabase {
    inner: Database,
}

impl InstrumentedDatabase {
    pub fn new(inner: Database) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Database {
        &self.inner
    }

    fn observe(&self, query_type: &'static str, start: Instant) {
        let seconds = start.elapsed().as_secs_f64();
        DATABASE_QUERIES_TOTAL
            .with_label_values(&[query_type])
            .inc();
        DATABASE_QUERY_DURATION_SECONDS
            .with_label_values(&[query_type])
            .observe(seconds);
    }
}

#[async_trait]
impl DatabaseBackend for InstrumentedDatabase {
    async fn insert_user(&self, user: &User) -> Result<(), PersistenceError> {
        let start = Instant::now();
        let res = self.inner.insert_user(user).await;
        self.observe("insert", start);
        res
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let start = Instant::now();
        let res = self.inner.get_user_by_id(id).await;
        self.observe("select", start);
        res
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let start = Instant::now();
        let res = self.inner.get_user_by_email(email).await;
        self.observe("select", start);
        res
    }

    async fn record_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let start = Instant::now();
        let res = self.inner.record_sign_in(id, at).await;
        self.observe("update", start);
        res
    }

    async fn record_failed_attempt(&self, id: Uuid) -> Result<i32> {
        let start = Instant::now();
        let res = self.inner.record_failed_attempt(id).await;
        self.observe("update", start);
        res
    }

    async fn count_users(&self) -> Result<i64> {
        let start = Instant::now();
        let res = self.inner.count_users().await;
        self.observe("select", start);
        res
    }

    async fn test_connection(&self) -> Result<()> {
        // Health checks are not counted as queries
        self.inner.test_connection().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_counts_queries_by_type() {
        let db = InstrumentedDatabase::new(Arc::new(MemoryBackend::new()));
        let before = DATABASE_QUERIES_TOTAL.with_label_values(&["insert"]).get();

        db.insert_user(&User::new("ada@example.com", "hash")).await.unwrap();

        let after = DATABASE_QUERIES_TOTAL.with_label_values(&["insert"]).get();
        assert!(after > before);
        assert!(db.inner().as_any().downcast_ref::<MemoryBackend>().is_some());
    }
}
