use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;
use std::time::Duration;

pub type SqlitePool = Pool<SqliteConnectionManager>;

pub fn create_pool(database_path: &str) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = Path::new(database_path).parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let manager = SqliteConnectionManager::file(database_path);

    Pool::builder()
        .max_size(15) // SQLite doesn't handle as many connections as Postgres
        .connection_timeout(Duration::from_secs(30))
        .build(manager)
        .context("Failed to create SQLite connection pool")
}

pub fn test_connection(pool: &SqlitePool) -> Result<()> {
    let conn = pool.get().context("Failed to get connection from pool")?;
    conn.query_row("SELECT 1", params![], |_| Ok(()))
        .context("Failed to test database connection")?;
    Ok(())
}

pub fn init_schema(pool: &SqlitePool) -> Result<()> {
    let conn = pool.get().context("Failed to get connection from pool")?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            encrypted_password TEXT NOT NULL,
            failed_attempts INTEGER NOT NULL DEFAULT 0,
            last_sign_in_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        params![],
    )
    .context("Failed to create users table")?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)",
        params![],
    )
    .context("Failed to create email index")?;

    Ok(())
}
