use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "postgres")]
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ValidationErrors;

pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const PASSWORD_MAX_LENGTH: usize = 128;
/// bcrypt only reads this many bytes of input
pub const PASSWORD_MAX_BYTES: usize = 72;

/// A registered account
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[cfg_attr(feature = "postgres", derive(FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// bcrypt hash; never sent to clients
    #[serde(skip_serializing)]
    pub encrypted_password: String,
    pub failed_attempts: i32,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh record with a time-ordered v7 id and no sign-in history
    pub fn new(email: impl Into<String>, encrypted_password: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email: email.into(),
            encrypted_password: encrypted_password.into(),
            failed_attempts: 0,
            last_sign_in_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_locked(&self, max_failed_attempts: i32) -> bool {
        max_failed_attempts > 0 && self.failed_attempts >= max_failed_attempts
    }
}

/// Registration input, as submitted by the client
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    /// No fields submitted at all
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }

    /// Trimmed, lower-cased email
    pub fn normalized_email(&self) -> String {
        self.email
            .as_deref()
            .map(|email| email.trim().to_lowercase())
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = self.normalized_email();
        if email.is_empty() {
            errors.add("email", "can't be blank");
        } else if !looks_like_email(&email) {
            errors.add("email", "is invalid");
        }

        match self.password.as_deref() {
            None | Some("") => errors.add("password", "can't be blank"),
            Some(password) => {
                let length = password.chars().count();
                if length < PASSWORD_MIN_LENGTH {
                    errors.add(
                        "password",
                        format!("is too short (minimum is {} characters)", PASSWORD_MIN_LENGTH),
                    );
                } else if length > PASSWORD_MAX_LENGTH {
                    errors.add(
                        "password",
                        format!("is too long (maximum is {} characters)", PASSWORD_MAX_LENGTH),
                    );
                } else if password.len() > PASSWORD_MAX_BYTES {
                    errors.add(
                        "password",
                        format!("is too long (maximum is {} bytes)", PASSWORD_MAX_BYTES),
                    );
                }
            }
        }

        errors.into_result()
    }
}

/// `local@domain` with no whitespace and a single `@`
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("ada@example.com", "$2b$04$hash");
        assert_eq!(user.failed_attempts, 0);
        assert!(user.last_sign_in_at.is_none());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_ids_are_uuid_v7() {
        let user = User::new("ada@example.com", "$2b$04$hash");
        assert_eq!(user.id.get_version_num(), 7);
        assert_ne!(user.id, User::new("ada@example.com", "$2b$04$hash").id);
    }

    #[test]
    fn test_encrypted_password_not_serialized() {
        let user = User::new("ada@example.com", "$2b$04$hash");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("encrypted_password").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["failed_attempts"], 0);
    }

    #[test]
    fn test_requires_email() {
        let errors = NewUser {
            email: None,
            password: Some("secret123".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.get("email").unwrap(), ["can't be blank"]);
        assert!(errors.get("password").is_none());
    }

    #[test]
    fn test_blank_user_reports_every_field() {
        let errors = NewUser::default().validate().unwrap_err();
        assert_eq!(errors.get("email").unwrap(), ["can't be blank"]);
        assert_eq!(errors.get("password").unwrap(), ["can't be blank"]);
    }

    #[test]
    fn test_rejects_malformed_email() {
        for email in ["plainaddress", "@example.com", "ada@", "a da@example.com", "a@b@c"] {
            let errors = NewUser::new(email, "secret123").validate().unwrap_err();
            assert_eq!(errors.get("email").unwrap(), ["is invalid"], "{}", email);
        }
    }

    #[test]
    fn test_password_length_bounds() {
        let short = NewUser::new("ada@example.com", "12345").validate().unwrap_err();
        assert_eq!(
            short.get("password").unwrap(),
            ["is too short (minimum is 6 characters)"]
        );

        let long = NewUser::new("ada@example.com", "x".repeat(129))
            .validate()
            .unwrap_err();
        assert_eq!(
            long.get("password").unwrap(),
            ["is too long (maximum is 128 characters)"]
        );

        assert!(NewUser::new("ada@example.com", "123456").validate().is_ok());
    }

    #[test]
    fn test_password_limited_to_bcrypt_input_bytes() {
        assert!(NewUser::new("ada@example.com", "x".repeat(72)).validate().is_ok());

        let ascii = NewUser::new("ada@example.com", "x".repeat(73))
            .validate()
            .unwrap_err();
        assert_eq!(ascii.get("password").unwrap(), ["is too long (maximum is 72 bytes)"]);

        // 40 characters, 80 bytes
        let multibyte = NewUser::new("ada@example.com", "é".repeat(40))
            .validate()
            .unwrap_err();
        assert_eq!(
            multibyte.get("password").unwrap(),
            ["is too long (maximum is 72 bytes)"]
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(NewUser::default().is_empty());
        assert!(!NewUser::new("", "").is_empty());
    }

    #[test]
    fn test_email_is_normalized() {
        let new_user = NewUser::new("  Ada@Example.COM ", "secret123");
        assert_eq!(new_user.normalized_email(), "ada@example.com");
        assert!(new_user.validate().is_ok());
    }

    #[test]
    fn test_lockout_threshold() {
        let mut user = User::new("ada@example.com", "$2b$04$hash");
        user.failed_attempts = 5;
        assert!(user.is_locked(5));
        assert!(!user.is_locked(6));
        assert!(!user.is_locked(0));
    }
}
