use anyhow::{Context, Result};

/// Hash a password with bcrypt on the blocking pool
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await?
        .context("Failed to hash password")
}

/// Check a password against a stored bcrypt hash.
///
/// A malformed stored hash is an error, not a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await?
        .context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        tokio_test::block_on(async {
            let hash = hash_password("secret123", 4)
                .await
                .unwrap();
            assert_ne!(hash, "secret123");
            assert!(verify_password("secret123", &hash).await.unwrap());
            assert!(!verify_password("wrong", &hash).await.unwrap());
        });
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        assert!(verify_password("secret123", "not-a-hash").await.is_err());
    }
}
