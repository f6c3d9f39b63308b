use actix_web::{get, web, HttpResponse};
use chrono::Utc;

use crate::{app_state::AppState, models::dto::response::HealthResponse};

#[get("/health")]
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = match state.db.health_check().await {
        Ok(()) => "ok",
        Err(err) => {
            log::warn!("Health check could not reach MongoDB: {}", err);
            "unreachable"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        api_key_configured: state.model_service.api_key_configured(),
        connected_clients: state.subscriber_count(),
        database,
    })
}
