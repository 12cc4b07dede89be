use crate::{
    auth::{policy, Identity},
    error::AppError,
    models::{
        CommentInput, SubtaskInput, SubtaskUpdate, Task, TaskInput, TaskQuery, TaskUpdate,
    },
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Loads a task and applies the resource-creator rule.
///
/// A missing task is `404`; somebody else's task is `403`.
async fn find_own_task(state: &AppState, identity: &Identity, task_id: Uuid) -> Result<Task, AppError> {
    let task = state
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    policy::resource_creator(identity, &task).into_result()?;
    Ok(task)
}

/// Retrieves the tasks created by the caller.
///
/// ## Query Parameters:
/// - `projectId` (optional): only tasks of this project.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    identity: Identity,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = state
        .tasks
        .list_by_creator(identity.id, query_params.project_id)
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Every task of a project the caller is a member of, whoever created it.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks.
/// - `403 Forbidden`: the caller is not a member.
/// - `404 Not Found`: no such project.
#[get("/project/{project_id}")]
pub async fn get_project_tasks(
    state: web::Data<AppState>,
    identity: Identity,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = state
        .projects
        .find_by_id(project_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
    policy::project_member(&identity, &project).into_result()?;

    let tasks = state.tasks.list_by_project(project.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task in a project the caller belongs to.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `403 Forbidden`: the caller is not a member of the project.
/// - `404 Not Found`: no such project.
/// - `422 Unprocessable Entity`: input validation failed.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    identity: Identity,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let project = state
        .projects
        .find_by_id(task_data.project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
    policy::project_member(&identity, &project).into_result()?;

    let task = Task::new(task_data.into_inner(), identity.id, state.clock.now());
    let task = state.tasks.create(task).await?;

    Ok(HttpResponse::Created().json(task))
}

#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    identity: Identity,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = find_own_task(&state, &identity, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partial update: only the fields present in the body change.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    identity: Identity,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let mut task = find_own_task(&state, &identity, task_id.into_inner()).await?;
    task.apply(task_data.into_inner(), state.clock.now());
    state.tasks.save(&task).await?;

    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    identity: Identity,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = find_own_task(&state, &identity, task_id.into_inner()).await?;

    if !state.tasks.delete(task.id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}

#[post("/{id}/comments")]
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    task_id: web::Path<Uuid>,
    comment_data: web::Json<CommentInput>,
) -> Result<impl Responder, AppError> {
    comment_data.validate()?;

    let mut task = find_own_task(&state, &identity, task_id.into_inner()).await?;
    task.add_comment(identity.id, &comment_data.text, state.clock.now());
    state.tasks.save(&task).await?;

    Ok(HttpResponse::Created().json(task))
}

#[post("/{id}/subtasks")]
pub async fn add_subtask(
    state: web::Data<AppState>,
    identity: Identity,
    task_id: web::Path<Uuid>,
    subtask_data: web::Json<SubtaskInput>,
) -> Result<impl Responder, AppError> {
    subtask_data.validate()?;

    let mut task = find_own_task(&state, &identity, task_id.into_inner()).await?;
    task.add_subtask(&subtask_data.title, state.clock.now());
    state.tasks.save(&task).await?;

    Ok(HttpResponse::Created().json(task))
}

#[put("/{id}/subtasks/{subtask_id}")]
pub async fn update_subtask(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    subtask_data: web::Json<SubtaskUpdate>,
) -> Result<impl Responder, AppError> {
    let (task_id, subtask_id) = path.into_inner();

    let mut task = find_own_task(&state, &identity, task_id).await?;
    task.set_subtask_completed(subtask_id, subtask_data.completed, state.clock.now())
        .ok_or_else(|| AppError::NotFound("Subtask not found".into()))?;
    state.tasks.save(&task).await?;

    Ok(HttpResponse::Ok().json(task))
}

#[cfg(test)]
mod tests {
    use crate::models::{TaskInput, TaskPriority, TaskStatus, TaskUpdate};
    use uuid::Uuid;
    use validator::Validate;

    fn input(title: &str, description: Option<String>) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description,
            project_id: Uuid::new_v4(),
            status: Some(TaskStatus::Todo),
            priority: Some(TaskPriority::High),
            assignee_ids: vec![],
            due_date: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_task_input_validation() {
        assert!(input("", None).validate().is_err(), "empty title");
        assert!(input(&"a".repeat(201), None).validate().is_err(), "long title");
        assert!(
            input("Valid", Some("b".repeat(1001))).validate().is_err(),
            "long description"
        );
        assert!(input("Valid Title", Some("Desc".into())).validate().is_ok());
    }

    #[test]
    fn test_task_update_validates_only_present_fields() {
        assert!(TaskUpdate::default().validate().is_ok());

        let update = TaskUpdate {
            title: Some(String::new()),
            ..TaskUpdate::default()
        };
        assert!(update.validate().is_err());
    }
}
