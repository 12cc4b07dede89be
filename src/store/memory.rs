//! In-process stores guarded by tokio `RwLock`s.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectStore, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{normalize_email, Project, Task, User};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, mut user: User) -> Result<User, AppError> {
        user.email = normalize_email(&user.email);
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        let mut user = user.clone();
        user.email = normalize_email(&user.email);
        let mut users = self.users.write().await;
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        match users.get_mut(&user.id) {
            Some(stored) => {
                stored.name = user.name;
                stored.email = user.email;
                stored.role = user.role;
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".into())),
        }
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.replace_password_hash(password_hash.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.set_reset_token(token_hash.to_string(), expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        let Some(user) = users
            .values_mut()
            .find(|u| u.reset_token_matches(token_hash, now))
        else {
            return Ok(None);
        };
        user.replace_password_hash(new_password_hash.to_string());
        user.clear_reset_token();
        Ok(Some(user.clone()))
    }
}

#[derive(Default)]
pub struct MemoryProjectStore {
    projects: RwLock<HashMap<Uuid, Project>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first_projects(mut projects: Vec<Project>) -> Vec<Project> {
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    projects
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn create(&self, project: Project) -> Result<Project, AppError> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.id) {
            return Err(AppError::Conflict("Project already exists".into()));
        }
        projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.projects.read().await.get(&id).cloned())
    }

    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Project>, AppError> {
        let projects = self.projects.read().await;
        Ok(newest_first_projects(
            projects
                .values()
                .filter(|p| p.is_member(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Project>, AppError> {
        let projects = self.projects.read().await;
        Ok(newest_first_projects(projects.values().cloned().collect()))
    }

    async fn save(&self, project: &Project) -> Result<(), AppError> {
        let mut projects = self.projects.write().await;
        match projects.get_mut(&project.id) {
            Some(stored) => {
                *stored = project.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Project not found".into())),
        }
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect<F>(&self, keep: F) -> Vec<Task>
    where
        F: Fn(&Task) -> bool,
    {
        let tasks = self.tasks.read().await;
        let mut selected: Vec<Task> = tasks.values().filter(|t| keep(t)).cloned().collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        selected
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, task: Task) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(AppError::Conflict("Task already exists".into()));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list_by_creator(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Task>, AppError> {
        Ok(self
            .collect(|t| t.user_id == user_id && project_id.map_or(true, |p| t.project_id == p))
            .await)
    }

    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Task>, AppError> {
        Ok(self.collect(|t| t.project_id == project_id).await)
    }

    async fn list_all(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.collect(|_| true).await)
    }

    async fn save(&self, task: &Task) -> Result<(), AppError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Task not found".into())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }
}
