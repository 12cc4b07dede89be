pub mod project;
pub mod task;
pub mod user;

pub use project::{Project, ProjectInput};
pub use task::{
    Comment, CommentInput, Subtask, SubtaskInput, SubtaskUpdate, Task, TaskInput, TaskPriority,
    TaskQuery, TaskStatus, TaskUpdate,
};
pub use user::{normalize_email, Role, User, UserProfile};
