pub mod backend;
pub mod instrumented;
pub mod memory;
pub mod schema;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use anyhow::{bail, Result};
use std::sync::Arc;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

pub use backend::{DatabaseBackend, PersistenceError};
pub use instrumented::InstrumentedDatabase;
pub use memory::MemoryBackend;

/// Database connection type - polymorphic over backends
pub type Database = Arc<dyn DatabaseBackend>;

/// Initialize database backend based on the `DATABASE_URL` scheme
pub async fn init_database(config: &crate::config::DatabaseConfig) -> Result<Database> {
    let url = config.url.as_str();

    if url.starts_with("memory:") {
        tracing::warn!("Using in-memory backend; data is lost on restart");
        return Ok(Arc::new(MemoryBackend::new()) as Database);
    }

    #[cfg(feature = "sqlite")]
    {
        if let Some(path) = url.strip_prefix("sqlite://") {
            tracing::info!("Initializing SQLite backend at {}", path);
            let pool = sqlite::connection::create_pool(path)?;
            let backend = SqliteBackend::new(pool)?;
            return Ok(Arc::new(backend) as Database);
        }
    }

    #[cfg(feature = "postgres")]
    {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            tracing::info!("Initializing PostgreSQL backend");
            let pool = postgres::connection::create_pool(config).await?;
            postgres::connection::test_connection(&pool).await?;
            schema::run_migrations(&pool).await?;
            return Ok(Arc::new(PostgresBackend::new(pool)) as Database);
        }
    }

    bail!(
        "Unsupported DATABASE_URL scheme (enabled backends: {})",
        enabled_backends().join(", ")
    )
}

fn enabled_backends() -> Vec<&'static str> {
    let mut backends = vec!["memory"];
    if cfg!(feature = "postgres") {
        backends.push("postgres");
    }
    if cfg!(feature = "sqlite") {
        backends.push("sqlite");
    }
    backends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: 1,
            acquire_timeout_ms: 1_000,
        }
    }

    #[tokio::test]
    async fn test_memory_scheme() {
        let db = init_database(&config("memory://")).await.unwrap();
        assert!(db.as_any().downcast_ref::<MemoryBackend>().is_some());
    }

    #[tokio::test]
    async fn test_unknown_scheme_is_rejected() {
        let err = init_database(&config("mysql://localhost/app")).await.err().unwrap();
        assert!(err.to_string().contains("memory"));
    }
}
