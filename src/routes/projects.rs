use crate::{
    auth::{policy, Identity},
    error::AppError,
    models::{Project, ProjectInput},
    state::AppState,
};
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(email)]
    pub email: String,
}

async fn find_project(state: &AppState, project_id: Uuid) -> Result<Project, AppError> {
    state
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

/// Create a project owned by the caller, who is also its first member.
#[post("")]
pub async fn create_project(
    state: web::Data<AppState>,
    identity: Identity,
    project_data: web::Json<ProjectInput>,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;

    let project = Project::new(project_data.into_inner(), identity.id, state.clock.now());
    let project = state.projects.create(project).await?;

    Ok(HttpResponse::Created().json(project))
}

/// Projects the caller is a member of.
#[get("")]
pub async fn list_projects(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    let projects = state.projects.list_for_member(identity.id).await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// Add a member by email. Owner only; adding an existing member changes nothing.
#[post("/{id}/members")]
pub async fn add_member(
    state: web::Data<AppState>,
    identity: Identity,
    project_id: web::Path<Uuid>,
    member_data: web::Json<AddMemberRequest>,
) -> Result<impl Responder, AppError> {
    member_data.validate()?;

    let mut project = find_project(&state, project_id.into_inner()).await?;
    policy::project_owner(&identity, &project).into_result()?;

    let member = state
        .users
        .find_by_email(&member_data.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if project.add_member(member.id) {
        state.projects.save(&project).await?;
    }

    Ok(HttpResponse::Ok().json(project))
}

/// Remove a member. Owner only; the owner stays a member.
#[delete("/{id}/members/{user_id}")]
pub async fn remove_member(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, AppError> {
    let (project_id, user_id) = path.into_inner();

    let mut project = find_project(&state, project_id).await?;
    policy::project_owner(&identity, &project).into_result()?;

    if user_id == project.owner_id {
        return Err(AppError::BadRequest(
            "The project owner cannot be removed".into(),
        ));
    }

    if project.remove_member(user_id) {
        state.projects.save(&project).await?;
    }

    Ok(HttpResponse::Ok().json(project))
}
