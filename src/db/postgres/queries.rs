use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::backend::PersistenceError;
use crate::models::user::User;

const USER_COLUMNS: &str =
    "id, email, encrypted_password, failed_attempts, last_sign_in_at, created_at, updated_at";

/// Insert a new user
pub async fn insert_user(pool: &PgPool, user: &User) -> Result<(), PersistenceError> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (
            id, email, encrypted_password, failed_attempts, last_sign_in_at,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.encrypted_password)
    .bind(user.failed_attempts)
    .bind(user.last_sign_in_at)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(PersistenceError::DuplicateEmail)
        }
        Err(e) => Err(anyhow::Error::new(e)
            .context("Failed to insert user")
            .into()),
    }
}

/// Get a user by ID
pub async fn get_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by ID")
}

/// Get a user by email
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by email")
}

/// Reset failed attempts and record the sign-in time
pub async fn record_sign_in(pool: &PgPool, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        "UPDATE users SET failed_attempts = 0, last_sign_in_at = $2, updated_at = $2 WHERE id = $1",
    )
    .bind(id)
    .bind(at)
    .execute(pool)
    .await
    .context("Failed to record sign-in")?;

    Ok(())
}

/// Increment failed attempts, returning the new count
pub async fn record_failed_attempt(pool: &PgPool, id: Uuid) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        UPDATE users
        SET failed_attempts = failed_attempts + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING failed_attempts
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to record failed attempt")?;

    row.map(|r| r.0)
        .with_context(|| format!("User {} vanished before failed attempt was recorded", id))
}

/// Get the total count of users
pub async fn count_users(pool: &PgPool) -> Result<i64> {
    let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(result.0)
}
