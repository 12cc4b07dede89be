#![allow(dead_code)]

use actix_web::body::{to_bytes, MessageBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use serde_json::Value;
use std::sync::Arc;

use taskforge_auth::auth::AuthResponse;
use taskforge_auth::clock::ManualClock;
use taskforge_auth::config::Config;
use taskforge_auth::models::Role;
use taskforge_auth::notifier::{MemoryNotifier, Notifier};
use taskforge_auth::state::AppState;

/// Shared state plus handles on the collaborators tests steer.
pub struct TestContext {
    pub state: web::Data<AppState>,
    pub clock: Arc<ManualClock>,
    pub notifier: Option<Arc<MemoryNotifier>>,
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some("integration-test-secret".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        "FRONTEND_URL" => Some("https://app.example.com".to_string()),
        _ => None,
    })
    .expect("test config")
}

/// In-memory state in demo mode (no notifier).
pub fn demo_context() -> TestContext {
    context(None)
}

/// In-memory state with a recording notifier.
pub fn notifier_context() -> TestContext {
    context(Some(Arc::new(MemoryNotifier::new())))
}

fn context(notifier: Option<Arc<MemoryNotifier>>) -> TestContext {
    let clock = Arc::new(ManualClock::default());
    let state = AppState::in_memory(
        &test_config(),
        notifier.clone().map(|n| n as Arc<dyn Notifier>),
        clock.clone(),
    );
    TestContext {
        state: web::Data::new(state),
        clock,
        notifier,
    }
}

/// Builds the full application the way `main` does, minus CORS.
#[macro_export]
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(actix_web::middleware::Logger::default())
                .wrap(actix_web::middleware::NormalizePath::trim())
                .service(taskforge_auth::routes::health::health)
                .service(
                    actix_web::web::scope("/api")
                        .wrap(taskforge_auth::auth::AuthMiddleware)
                        .configure(taskforge_auth::routes::config),
                ),
        )
        .await
    };
}

/// Sends a request and returns status and JSON body (`Null` when empty).
///
/// Errors raised by middleware are rendered the same way the server would.
pub async fn send<S, B>(app: &S, req: test::TestRequest, token: Option<&str>) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = match token {
        Some(token) => req.insert_header(("Authorization", format!("Bearer {}", token))),
        None => req,
    };

    let (status, bytes) = match test::try_call_service(app, req.to_request()).await {
        Ok(resp) => {
            let status = resp.status();
            (status, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let bytes = to_bytes(resp.into_body())
                .await
                .unwrap_or_else(|_| panic!("unreadable error body"));
            (status, bytes)
        }
    };

    if bytes.is_empty() {
        return (status, Value::Null);
    }
    let json = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, json)
}

pub async fn register<S, B>(app: &S, name: &str, email: &str, password: &str) -> AuthResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(serde_json::json!({
                "name": name,
                "email": email,
                "password": password
            })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    serde_json::from_value(body).expect("auth response")
}

/// Promotes a registered user straight through the store.
pub async fn make_admin(ctx: &TestContext, email: &str) {
    let mut user = ctx
        .state
        .users
        .find_by_email(email)
        .await
        .unwrap()
        .expect("registered user");
    user.role = Role::Admin;
    ctx.state.users.save(&user).await.unwrap();
}
