use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub project_id: Uuid,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    #[serde(default)]
    pub assignee_ids: Vec<Uuid>,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of a task. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub assignee_ids: Option<Vec<Uuid>>,

    pub due_date: Option<DateTime<Utc>>,

    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubtaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubtaskUpdate {
    pub completed: bool,
}

/// Represents query parameters for filtering the caller's own tasks.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub project_id: Option<Uuid>,
}

/// Represents a task entity as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub project_id: Uuid,
    /// Identifier of the user who created the task. Governs read and write access.
    pub user_id: Uuid,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_ids: Vec<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub subtasks: Vec<Subtask>,
    pub activity: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` from `TaskInput` and the creator's id.
    pub fn new(input: TaskInput, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            project_id: input.project_id,
            user_id,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            assignee_ids: input.assignee_ids,
            due_date: input.due_date,
            tags: clean_tags(input.tags),
            comments: Vec::new(),
            subtasks: Vec::new(),
            activity: vec!["Task created".to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: TaskUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(status) = update.status {
            if status != self.status {
                self.activity.push(format!("Status changed to {}", status.as_str()));
            }
            self.status = status;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(assignee_ids) = update.assignee_ids {
            self.assignee_ids = assignee_ids;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(tags) = update.tags {
            self.tags = clean_tags(tags);
        }
        self.activity.push("Task updated".to_string());
        self.updated_at = now;
    }

    pub fn add_comment(&mut self, user_id: Uuid, text: &str, now: DateTime<Utc>) -> Comment {
        let comment = Comment {
            id: Uuid::new_v4(),
            user_id,
            text: text.trim().to_string(),
            created_at: now,
        };
        self.comments.push(comment.clone());
        self.activity.push("Comment added".to_string());
        self.updated_at = now;
        comment
    }

    pub fn add_subtask(&mut self, title: &str, now: DateTime<Utc>) -> Subtask {
        let subtask = Subtask {
            id: Uuid::new_v4(),
            title: title.trim().to_string(),
            completed: false,
            created_at: now,
        };
        self.subtasks.push(subtask.clone());
        self.activity.push("Subtask added".to_string());
        self.updated_at = now;
        subtask
    }

    /// Returns `None` if no subtask has that id.
    pub fn set_subtask_completed(
        &mut self,
        subtask_id: Uuid,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Option<Subtask> {
        let subtask = self.subtasks.iter_mut().find(|s| s.id == subtask_id)?;
        subtask.completed = completed;
        let updated = subtask.clone();
        self.updated_at = now;
        Some(updated)
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input(title: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: Some("Test Description".to_string()),
            project_id: Uuid::new_v4(),
            status: None,
            priority: None,
            assignee_ids: vec![],
            due_date: None,
            tags: vec![" backend ".to_string(), "  ".to_string()],
        }
    }

    #[test]
    fn test_task_creation_defaults() {
        let creator = Uuid::new_v4();
        let task = Task::new(input("Test Task"), creator, Utc::now());

        assert_eq!(task.title, "Test Task");
        assert_eq!(task.user_id, creator);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.tags, vec!["backend"]);
        assert_eq!(task.activity, vec!["Task created"]);
        assert!(task.assignee_ids.is_empty());
    }

    #[test]
    fn test_task_validation() {
        assert!(input("Valid Task").validate().is_ok());
        assert!(input("").validate().is_err());
        assert!(input(&"a".repeat(201)).validate().is_err());

        let mut long_description = input("Valid title");
        long_description.description = Some("b".repeat(1001));
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn test_partial_update_only_touches_given_fields() {
        let created = Utc::now();
        let mut task = Task::new(input("Original"), Uuid::new_v4(), created);
        let later = created + Duration::minutes(5);

        task.apply(
            TaskUpdate {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
            later,
        );

        assert_eq!(task.title, "Original");
        assert_eq!(task.description.as_deref(), Some("Test Description"));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.updated_at, later);
        assert_eq!(task.created_at, created);
        assert!(task
            .activity
            .contains(&"Status changed to in-progress".to_string()));
    }

    #[test]
    fn test_comments_and_subtasks() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let mut task = Task::new(input("With children"), author, now);

        let comment = task.add_comment(author, " Looks good ", now);
        assert_eq!(comment.text, "Looks good");
        assert_eq!(task.comments, vec![comment]);

        let subtask = task.add_subtask("Write tests", now);
        assert!(!subtask.completed);

        let toggled = task.set_subtask_completed(subtask.id, true, now).unwrap();
        assert!(toggled.completed);
        assert!(task.subtasks[0].completed);
        assert!(task.set_subtask_completed(Uuid::new_v4(), true, now).is_none());
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            serde_json::json!("in-progress")
        );
        let status: TaskStatus = serde_json::from_value(serde_json::json!("done")).unwrap();
        assert_eq!(status, TaskStatus::Done);
    }
}
