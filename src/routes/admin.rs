//! Administrative endpoints. Every handler starts with the admin-only rule.

use crate::{
    auth::{policy, Identity, UserAction},
    error::AppError,
    models::{Role, UserProfile},
    state::AppState,
};
use actix_web::{delete, get, put, web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

/// All users, newest first.
#[get("/users")]
pub async fn list_users(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    policy::admin_only(&identity).into_result()?;

    let users: Vec<UserProfile> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

/// Set the role of a user. Unknown role names are rejected by the JSON extractor.
#[put("/users/{id}/role")]
pub async fn update_role(
    state: web::Data<AppState>,
    identity: Identity,
    user_id: web::Path<Uuid>,
    role_data: web::Json<RoleUpdate>,
) -> Result<impl Responder, AppError> {
    let user_id = user_id.into_inner();
    policy::admin_only(&identity).into_result()?;
    policy::self_or_admin(&identity, user_id, UserAction::Update).into_result()?;

    let mut user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    user.role = role_data.role;
    state.users.save(&user).await?;
    log::info!("user {} set role of {} to {:?}", identity.id, user.id, user.role);

    Ok(HttpResponse::Ok().json(user.profile()))
}

/// Delete a user. Admins cannot delete themselves.
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    identity: Identity,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let user_id = user_id.into_inner();
    policy::admin_only(&identity).into_result()?;
    policy::self_or_admin(&identity, user_id, UserAction::Delete).into_result()?;

    if !state.users.delete(user_id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    log::info!("user {} deleted user {}", identity.id, user_id);

    Ok(HttpResponse::NoContent().finish())
}

#[get("/tasks")]
pub async fn list_all_tasks(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    policy::admin_only(&identity).into_result()?;
    Ok(HttpResponse::Ok().json(state.tasks.list_all().await?))
}

#[get("/projects")]
pub async fn list_all_projects(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    policy::admin_only(&identity).into_result()?;
    Ok(HttpResponse::Ok().json(state.projects.list_all().await?))
}
