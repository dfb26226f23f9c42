#[cfg(feature = "postgres")]
use anyhow::{Context, Result};
#[cfg(feature = "postgres")]
use sqlx::PgPool;
#[cfg(feature = "postgres")]
use tracing::info;

#[cfg(feature = "postgres")]
const MIGRATION_SQL: &str = include_str!("../../migrations/001_create_users.sql");

#[cfg(feature = "postgres")]
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    let statements = split_sql_statements(MIGRATION_SQL);

    for (i, statement) in statements.iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| {
                format!(
                    "Failed to execute migration statement {}: {}",
                    i + 1,
                    statement.lines().next().unwrap_or_default()
                )
            })?;
    }

    info!("Database migrations completed successfully");
    Ok(())
}

/// Split a migration script into statements, dropping `--` comment lines
#[cfg(any(feature = "postgres", test))]
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }

        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            statements.push(current.trim().to_string());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    statements
}
