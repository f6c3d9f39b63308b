use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::Principal,
    constants::badges::BADGE_CATALOG,
    errors::AppError,
    models::domain::AttemptResult,
    models::dto::request::{LeaderboardQuery, RecordAttemptRequest},
    models::dto::response::{
        AvailableBadgeDto, BadgeDto, DashboardUpdate, ProfileResponse, RecordAttemptResponse,
    },
};

#[get("/api/profile")]
async fn get_profile(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let profile = state.profile_service.get_profile(principal.as_str()).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(&profile)))
}

#[get("/api/badges")]
async fn get_badges(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let badges = state.profile_service.get_badges(principal.as_str()).await?;
    let badges: Vec<BadgeDto> = badges.iter().map(BadgeDto::from).collect();
    Ok(HttpResponse::Ok().json(badges))
}

#[get("/api/badges/available")]
async fn available_badges() -> HttpResponse {
    let badges: Vec<AvailableBadgeDto> =
        BADGE_CATALOG.iter().map(AvailableBadgeDto::from).collect();
    HttpResponse::Ok().json(badges)
}

#[get("/api/badges/count")]
async fn badge_count(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let badges = state.profile_service.get_badges(principal.as_str()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "count": badges.len() })))
}

/// Sole mutation entry point for profiles. A persistence failure here is a
/// real error to the caller; the learner's on-screen score never depended
/// on this call succeeding.
#[post("/api/attempts")]
async fn record_attempt(
    state: web::Data<AppState>,
    principal: Principal,
    request: web::Json<RecordAttemptRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let result = AttemptResult::new(
        request.topic,
        request.difficulty,
        request.correct_count,
        request.total_questions,
    );

    let recorded = state
        .profile_service
        .record_attempt(principal.as_str(), result.clone(), request.attempt_id)
        .await
        .inspect_err(|err| {
            log::error!(
                "Failed to persist attempt for {}: {} (progress is lost unless retried)",
                principal,
                err
            );
        })?;

    if !recorded.already_recorded {
        state.broadcast(DashboardUpdate::AttemptRecorded {
            principal: principal.to_string(),
            topic: result.topic.clone(),
            score_percent: result.score_percent,
            timestamp: Utc::now().timestamp_millis(),
        });
        for badge in &recorded.new_badges {
            state.broadcast(DashboardUpdate::BadgeEarned {
                principal: principal.to_string(),
                badge_id: badge.id.clone(),
                name: badge.name.clone(),
                rarity: badge.rarity,
                timestamp: Utc::now().timestamp_millis(),
            });
        }
    }

    Ok(HttpResponse::Ok().json(RecordAttemptResponse {
        profile: ProfileResponse::from(&recorded.profile),
        new_badges: recorded.new_badges.iter().map(BadgeDto::from).collect(),
    }))
}

#[get("/api/leaderboard")]
async fn leaderboard(
    state: web::Data<AppState>,
    query: web::Query<LeaderboardQuery>,
) -> Result<HttpResponse, AppError> {
    let entries = state.profile_service.leaderboard(query.limit()).await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[get("/api/leaderboard/{topic}")]
async fn topic_leaderboard(
    state: web::Data<AppState>,
    topic: web::Path<String>,
    query: web::Query<LeaderboardQuery>,
) -> Result<HttpResponse, AppError> {
    let entries = state
        .profile_service
        .topic_leaderboard(&topic, query.limit())
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[get("/api/stats")]
async fn quiz_stats(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let stats = state.profile_service.stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
