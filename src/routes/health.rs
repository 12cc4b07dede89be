use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

use crate::state::AppState;

/// Health check endpoint
///
/// Reports the server time and how password resets are delivered.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let reset_delivery = if state.auth.is_demo_mode() {
        "demo"
    } else {
        "email"
    };

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": state.clock.now(),
        "resetDelivery": reset_delivery,
    }))
}
