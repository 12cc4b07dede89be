//! One-time password reset secrets.
//!
//! A secret is 32 bytes from the OS RNG, hex encoded. Only its SHA-256 digest is
//! persisted; the plaintext exists in memory just long enough to be handed to
//! the notifier (or, in demo mode, to the client).

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use crate::auth::password::PasswordHasher;
use crate::clock::Clock;
use crate::error::AppError;
use crate::models::UserProfile;
use crate::store::UserStore;

const SECRET_BYTES: usize = 32;

/// Plaintext reset secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetSecret(String);

impl ResetSecret {
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// The stored form of this secret.
    pub fn digest(&self) -> String {
        hash_secret(&self.0)
    }
}

impl fmt::Debug for ResetSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("ResetSecret([REDACTED])")
    }
}

/// SHA-256 of a presented secret, hex encoded.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// A freshly stored reset, ready to be delivered.
#[derive(Debug)]
pub struct IssuedReset {
    pub user: UserProfile,
    pub secret: ResetSecret,
    pub expires_at: DateTime<Utc>,
}

pub struct ResetHandshake {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResetHandshake {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores a new pending reset for `email`, superseding any earlier one.
    ///
    /// Returns `None` for an unknown email; nothing is generated in that case.
    pub async fn request_reset(&self, email: &str) -> Result<Option<IssuedReset>, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(None);
        };

        let secret = ResetSecret::generate();
        let expires_at = self.clock.now() + self.ttl;

        if !self
            .users
            .set_reset_token(user.id, &secret.digest(), expires_at)
            .await?
        {
            // Deleted between the lookup and the write.
            return Ok(None);
        }

        log::info!("password reset issued for user {}", user.id);
        Ok(Some(IssuedReset {
            user: user.profile(),
            secret,
            expires_at,
        }))
    }

    /// Exchanges a valid secret for a new password.
    ///
    /// Unknown, superseded, consumed and expired secrets all fail with
    /// `AppError::InvalidOrExpiredToken`.
    pub async fn complete_reset(
        &self,
        secret: &str,
        new_password: &str,
    ) -> Result<UserProfile, AppError> {
        let new_hash = self.hasher.hash(new_password)?;
        let consumed = self
            .users
            .consume_reset_token(&hash_secret(secret.trim()), self.clock.now(), &new_hash)
            .await?;

        match consumed {
            Some(user) => {
                log::info!("password reset completed for user {}", user.id);
                Ok(user.profile())
            }
            None => Err(AppError::InvalidOrExpiredToken),
        }
    }
}
