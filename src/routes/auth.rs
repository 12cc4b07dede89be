use crate::{
    auth::{
        ChangePasswordRequest, ForgotPasswordRequest, Identity, LoginRequest, RegisterRequest,
        ResetPasswordRequest,
    },
    error::AppError,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Creates a new account with the `user` role and returns a token plus the
/// profile. A taken email is `409 Conflict`.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let response = state
        .auth
        .register(
            &register_data.name,
            &register_data.email,
            &register_data.password,
        )
        .await?;

    Ok(HttpResponse::Created().json(response))
}

/// Login user
///
/// Any mismatch is `401` with the same message.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let response = state
        .auth
        .login(&login_data.email, &login_data.password)
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Profile of the caller.
#[get("/me")]
pub async fn me(identity: Identity) -> impl Responder {
    HttpResponse::Ok().json(identity.0)
}

/// Tokens are stateless, so there is nothing to invalidate server side; the
/// client drops its copy.
#[post("/logout")]
pub async fn logout() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Logged out" }))
}

/// Start a password reset.
///
/// Always `200`. See [`ResetRequestResponse`](crate::auth::ResetRequestResponse)
/// for what the body contains in demo mode.
#[post("/forgot")]
pub async fn forgot_password(
    state: web::Data<AppState>,
    forgot_data: web::Json<ForgotPasswordRequest>,
) -> Result<impl Responder, AppError> {
    forgot_data.validate()?;

    let response = state.auth.request_reset(&forgot_data.email).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Finish a password reset with the secret from the notification.
#[post("/reset")]
pub async fn reset_password(
    state: web::Data<AppState>,
    reset_data: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    reset_data.validate()?;

    state
        .auth
        .complete_reset(&reset_data.reset_token, &reset_data.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Password has been reset" })))
}

#[post("/change-password")]
pub async fn change_password(
    state: web::Data<AppState>,
    identity: Identity,
    change_data: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    change_data.validate()?;

    state
        .auth
        .change_password(
            &identity,
            &change_data.current_password,
            &change_data.new_password,
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated" })))
}
