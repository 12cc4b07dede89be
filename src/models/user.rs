use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::auth::password::PasswordHasher;
use crate::error::AppError;

/// Lower-cases and trims an email so lookups and uniqueness are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Role of a user account.
/// Corresponds to the `user_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A stored account, including credential and reset state.
///
/// Deliberately not `Serialize`: anything leaving the process goes through
/// [`UserProfile`], which has no password field.
#[derive(Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    password_hash: String,
    pub role: Role,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new account, hashing `password` before it is stored anywhere.
    pub fn new(
        name: &str,
        email: &str,
        password: &str,
        hasher: &PasswordHasher,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash: hasher.hash(password)?,
            role: Role::default(),
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
        })
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Replaces the password. The plaintext is hashed here and never kept.
    pub fn set_password(&mut self, password: &str, hasher: &PasswordHasher) -> Result<(), AppError> {
        self.password_hash = hasher.hash(password)?;
        Ok(())
    }

    /// Installs a hash produced elsewhere, e.g. by a reset that hashed the new
    /// password before taking the store lock.
    pub(crate) fn replace_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
    }

    pub fn verify_password(&self, password: &str, hasher: &PasswordHasher) -> Result<bool, AppError> {
        hasher.verify(password, &self.password_hash)
    }

    pub fn reset_token_hash(&self) -> Option<&str> {
        self.reset_token_hash.as_deref()
    }

    pub fn reset_token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.reset_token_expires_at
    }

    /// Stores a pending reset, replacing whichever one was there before.
    pub fn set_reset_token(&mut self, token_hash: String, expires_at: DateTime<Utc>) {
        self.reset_token_hash = Some(token_hash);
        self.reset_token_expires_at = Some(expires_at);
    }

    pub fn clear_reset_token(&mut self) {
        self.reset_token_hash = None;
        self.reset_token_expires_at = None;
    }

    /// True when `token_hash` is the pending reset and it has not expired at `now`.
    pub fn reset_token_matches(&self, token_hash: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_token_hash, self.reset_token_expires_at) {
            (Some(stored), Some(expires_at)) => stored == token_hash && expires_at > now,
            _ => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("reset_pending", &self.reset_token_hash.is_some())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// The externally visible projection of a [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_new_user_normalizes_email_and_hashes_password() {
        let user = User::new(" Alice ", "  Alice@Example.COM ", "password123", &hasher(), Utc::now())
            .unwrap();

        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash(), "password123");
        assert!(user.verify_password("password123", &hasher()).unwrap());
        assert!(user.reset_token_hash().is_none());
    }

    #[test]
    fn test_set_password_rehashes() {
        let mut user = User::new("Bob", "bob@example.com", "first-pass", &hasher(), Utc::now()).unwrap();
        let old_hash = user.password_hash().to_string();

        user.set_password("second-pass", &hasher()).unwrap();

        assert_ne!(user.password_hash(), old_hash);
        assert!(!user.verify_password("first-pass", &hasher()).unwrap());
        assert!(user.verify_password("second-pass", &hasher()).unwrap());
    }

    #[test]
    fn test_reset_token_matching_respects_expiry() {
        let now = Utc::now();
        let mut user = User::new("Carol", "carol@example.com", "password", &hasher(), now).unwrap();
        user.set_reset_token("abc".into(), now + Duration::minutes(15));

        assert!(user.reset_token_matches("abc", now));
        assert!(!user.reset_token_matches("abd", now));
        assert!(!user.reset_token_matches("abc", now + Duration::minutes(15)));

        user.clear_reset_token();
        assert!(!user.reset_token_matches("abc", now));
    }

    #[test]
    fn test_profile_serialization_has_no_password() {
        let user = User::new("Dave", "dave@example.com", "password", &hasher(), Utc::now()).unwrap();
        let json = serde_json::to_value(user.profile()).unwrap();

        assert_eq!(json["email"], "dave@example.com");
        assert_eq!(json["role"], "user");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_debug_output_hides_credentials() {
        let user = User::new("Eve", "eve@example.com", "password", &hasher(), Utc::now()).unwrap();
        let rendered = format!("{:?}", user);

        assert!(!rendered.contains(user.password_hash()));
    }
}
