use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::backend::PersistenceError;
use crate::db::sqlite::connection::SqlitePool;
use crate::models::user::User;

const SELECT_USER: &str = "SELECT id, email, encrypted_password, failed_attempts, last_sign_in_at, created_at, updated_at FROM users";

/// Insert a new user
pub fn insert_user(pool: &SqlitePool, user: &User) -> Result<(), PersistenceError> {
    let conn = pool.get().context("Failed to get connection from pool")?;

    let result = conn.execute(
        r#"
        INSERT INTO users (
            id, email, encrypted_password, failed_attempts, last_sign_in_at,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            user.id.to_string(),
            &user.email,
            &user.encrypted_password,
            user.failed_attempts,
            user.last_sign_in_at,
            user.created_at,
            user.updated_at,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            Err(PersistenceError::DuplicateEmail)
        }
        Err(e) => Err(anyhow::Error::new(e).context("Failed to insert user").into()),
    }
}

/// Get a user by ID
pub fn get_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let conn = pool.get().context("Failed to get connection from pool")?;

    let user = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_USER),
            params![id.to_string()],
            row_to_user,
        )
        .optional()
        .context("Failed to fetch user by ID")?;

    Ok(user)
}

/// Get a user by email
pub fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let conn = pool.get().context("Failed to get connection from pool")?;

    let user = conn
        .query_row(
            &format!("{} WHERE email = ?1", SELECT_USER),
            params![email],
            row_to_user,
        )
        .optional()
        .context("Failed to fetch user by email")?;

    Ok(user)
}

/// Reset failed attempts and record the sign-in time
pub fn record_sign_in(pool: &SqlitePool, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let conn = pool.get().context("Failed to get connection from pool")?;

    conn.execute(
        "UPDATE users SET failed_attempts = 0, last_sign_in_at = ?2, updated_at = ?2 WHERE id = ?1",
        params![id.to_string(), at],
    )
    .context("Failed to record sign-in")?;

    Ok(())
}

/// Increment failed attempts, returning the new count
pub fn record_failed_attempt(pool: &SqlitePool, id: Uuid) -> Result<i32> {
    let conn = pool.get().context("Failed to get connection from pool")?;

    let count = conn
        .query_row(
            r#"
            UPDATE users
            SET failed_attempts = failed_attempts + 1, updated_at = ?2
            WHERE id = ?1
            RETURNING failed_attempts
            "#,
            params![id.to_string(), Utc::now()],
            |row| row.get::<_, i32>(0),
        )
        .optional()
        .context("Failed to record failed attempt")?;

    count.with_context(|| format!("User {} vanished before failed attempt was recorded", id))
}

/// Get the total count of users
pub fn count_users(pool: &SqlitePool) -> Result<i64> {
    let conn = pool.get().context("Failed to get connection from pool")?;
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", params![], |row| row.get(0))
        .context("Failed to count users")?;
    Ok(count)
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(User {
        id,
        email: row.get(1)?,
        encrypted_password: row.get(2)?,
        failed_attempts: row.get(3)?,
        last_sign_in_at: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::connection::init_schema;
    use r2d2_sqlite::SqliteConnectionManager;

    fn memory_pool() -> SqlitePool {
        // A single connection so every query sees the same in-memory database
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .unwrap();
        init_schema(&pool).unwrap();
        pool
    }

    #[test]
    fn test_insert_and_fetch_user() {
        let pool = memory_pool();
        let user = User::new("ada@example.com", "hash");
        insert_user(&pool, &user).unwrap();

        let by_id = get_user_by_id(&pool, user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");
        assert_eq!(by_id.failed_attempts, 0);

        let by_email = get_user_by_email(&pool, "ada@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(count_users(&pool).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_email_maps_to_persistence_error() {
        let pool = memory_pool();
        insert_user(&pool, &User::new("ada@example.com", "hash")).unwrap();

        let err = insert_user(&pool, &User::new("ada@example.com", "hash")).unwrap_err();
        assert!(matches!(err, PersistenceError::DuplicateEmail));
    }

    #[test]
    fn test_failed_attempts_and_sign_in() {
        let pool = memory_pool();
        let user = User::new("ada@example.com", "hash");
        insert_user(&pool, &user).unwrap();

        assert_eq!(record_failed_attempt(&pool, user.id).unwrap(), 1);
        assert_eq!(record_failed_attempt(&pool, user.id).unwrap(), 2);

        record_sign_in(&pool, user.id, Utc::now()).unwrap();
        let stored = get_user_by_id(&pool, user.id).unwrap().unwrap();
        assert_eq!(stored.failed_attempts, 0);
        assert!(stored.last_sign_in_at.is_some());
    }
}
