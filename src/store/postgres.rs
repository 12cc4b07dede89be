//! Postgres backend.
//!
//! Queries are bound at runtime (`query_as` + `FromRow`) so the crate builds
//! without a live database. The schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ProjectStore, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{
    normalize_email, Comment, Project, Subtask, Task, TaskPriority, TaskStatus, User,
};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, reset_token_hash, reset_token_expires_at, created_at";
const PROJECT_COLUMNS: &str = "id, name, description, owner_id, member_ids, created_at";
const TASK_COLUMNS: &str = "id, title, description, project_id, user_id, status, priority, \
     assignee_ids, due_date, tags, comments, subtasks, activity, created_at, updated_at";

/// Opens a pool and brings the schema up to date.
pub async fn connect(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

fn email_conflict(error: sqlx::Error) -> AppError {
    match AppError::from(error) {
        AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
        other => other,
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, user: User) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(normalize_email(&user.email))
            .bind(user.password_hash())
            .bind(user.role)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(email_conflict)
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET name = $2, email = $3, role = $4 WHERE id = $1")
            .bind(user.id)
            .bind(&user.name)
            .bind(normalize_email(&user.email))
            .bind(user.role)
            .execute(&self.pool)
            .await
            .map_err(email_conflict)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        // The WHERE clause is re-checked under the row lock, so of two
        // concurrent consumers only one sees a matching row.
        let sql = format!(
            "UPDATE users SET password_hash = $3, reset_token_hash = NULL, \
             reset_token_expires_at = NULL \
             WHERE reset_token_hash = $1 AND reset_token_expires_at > $2 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(token_hash)
            .bind(now)
            .bind(new_password_hash)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[derive(Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn create(&self, project: Project) -> Result<Project, AppError> {
        let sql = format!(
            "INSERT INTO projects (id, name, description, owner_id, member_ids, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.owner_id)
            .bind(&project.member_ids)
            .bind(project.created_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Project>, AppError> {
        let sql = format!(
            "SELECT {} FROM projects WHERE $1 = ANY(member_ids) ORDER BY created_at DESC",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_all(&self) -> Result<Vec<Project>, AppError> {
        let sql = format!("SELECT {} FROM projects ORDER BY created_at DESC", PROJECT_COLUMNS);
        Ok(sqlx::query_as::<_, Project>(&sql).fetch_all(&self.pool).await?)
    }

    async fn save(&self, project: &Project) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE projects SET name = $2, description = $3, owner_id = $4, member_ids = $5 \
             WHERE id = $1",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.owner_id)
        .bind(&project.member_ids)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project not found".into()));
        }
        Ok(())
    }
}

/// Row shape of `tasks`; comments and subtasks are JSONB.
#[derive(FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    project_id: Uuid,
    user_id: Uuid,
    status: TaskStatus,
    priority: TaskPriority,
    assignee_ids: Vec<Uuid>,
    due_date: Option<DateTime<Utc>>,
    tags: Vec<String>,
    comments: Json<Vec<Comment>>,
    subtasks: Json<Vec<Subtask>>,
    activity: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            project_id: row.project_id,
            user_id: row.user_id,
            status: row.status,
            priority: row.priority,
            assignee_ids: row.assignee_ids,
            due_date: row.due_date,
            tags: row.tags,
            comments: row.comments.0,
            subtasks: row.subtasks.0,
            activity: row.activity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_all(&self, sql: &str, binds: &[Uuid]) -> Result<Vec<Task>, AppError> {
        let mut query = sqlx::query_as::<_, TaskRow>(sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, task: Task) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks (id, title, description, project_id, user_id, status, priority, \
             assignee_ids, due_date, tags, comments, subtasks, activity, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {}",
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.project_id)
            .bind(task.user_id)
            .bind(task.status)
            .bind(task.priority)
            .bind(&task.assignee_ids)
            .bind(task.due_date)
            .bind(&task.tags)
            .bind(Json(&task.comments))
            .bind(Json(&task.subtasks))
            .bind(&task.activity)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn list_by_creator(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Task>, AppError> {
        match project_id {
            Some(project_id) => {
                let sql = format!(
                    "SELECT {} FROM tasks WHERE user_id = $1 AND project_id = $2 \
                     ORDER BY created_at DESC",
                    TASK_COLUMNS
                );
                self.fetch_all(&sql, &[user_id, project_id]).await
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC",
                    TASK_COLUMNS
                );
                self.fetch_all(&sql, &[user_id]).await
            }
        }
    }

    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE project_id = $1 ORDER BY created_at DESC",
            TASK_COLUMNS
        );
        self.fetch_all(&sql, &[project_id]).await
    }

    async fn list_all(&self) -> Result<Vec<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks ORDER BY created_at DESC", TASK_COLUMNS);
        self.fetch_all(&sql, &[]).await
    }

    async fn save(&self, task: &Task) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE tasks SET title = $2, description = $3, status = $4, priority = $5, \
             assignee_ids = $6, due_date = $7, tags = $8, comments = $9, subtasks = $10, \
             activity = $11, updated_at = $12 WHERE id = $1",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(&task.assignee_ids)
        .bind(task.due_date)
        .bind(&task.tags)
        .bind(Json(&task.comments))
        .bind(Json(&task.subtasks))
        .bind(&task.activity)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Task not found".into()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
