//! Persistence seams.
//!
//! The auth core and the handlers talk to storage only through these traits.
//! [`memory`] keeps everything in process and backs the tests and the
//! database-less dev mode; [`postgres`] is the production backend.
//!
//! Every method that writes a user record is a single atomic step in both
//! backends, so concurrent requests for the same account serialize at the
//! storage layer.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Project, Task, User};

pub use memory::{MemoryProjectStore, MemoryTaskStore, MemoryUserStore};
pub use postgres::{PgProjectStore, PgTaskStore, PgUserStore};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Inserts a new user. Fails with `AppError::Conflict` if the email is taken.
    async fn create(&self, user: User) -> Result<User, AppError>;

    /// Writes the profile fields (name, email, role) of an existing user.
    /// Fails with `AppError::NotFound` if it is gone.
    ///
    /// Password and reset state are never written from a snapshot; they only
    /// change through the targeted operations below.
    async fn save(&self, user: &User) -> Result<(), AppError>;

    /// Replaces the password hash of one user. Returns `false` if the user is gone.
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// All users, newest first.
    async fn list(&self) -> Result<Vec<User>, AppError>;

    /// Replaces the pending reset of one user. Returns `false` if the user is gone.
    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Atomically finds the user whose pending reset hash is `token_hash` and
    /// unexpired at `now`, sets `new_password_hash`, and clears the reset.
    ///
    /// At most one caller can consume a given reset.
    async fn consume_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, project: Project) -> Result<Project, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError>;

    /// Projects that list `user_id` as a member, newest first.
    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Project>, AppError>;

    /// Every project, newest first.
    async fn list_all(&self) -> Result<Vec<Project>, AppError>;

    async fn save(&self, project: &Project) -> Result<(), AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: Task) -> Result<Task, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    /// Tasks created by `user_id`, optionally within one project, newest first.
    async fn list_by_creator(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Task>, AppError>;

    /// Every task in a project, newest first.
    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Task>, AppError>;

    /// Every task, newest first.
    async fn list_all(&self) -> Result<Vec<Task>, AppError>;

    async fn save(&self, task: &Task) -> Result<(), AppError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
