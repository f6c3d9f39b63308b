use actix_web::{delete, get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::Principal,
    errors::AppError,
    models::dto::request::{GenerateQuizRequest, SelectOptionRequest},
    models::dto::response::AttemptResultDto,
};

#[post("/api/sessions")]
async fn start_session(
    state: web::Data<AppState>,
    principal: Principal,
    request: web::Json<GenerateQuizRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let view = state
        .session_service
        .start(
            principal.as_str(),
            &request.topic,
            request.difficulty,
            request.num_questions,
        )
        .await?;

    Ok(HttpResponse::Created().json(view))
}

#[get("/api/sessions")]
async fn current_session(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let view = state.session_service.snapshot(principal.as_str()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/sessions/select")]
async fn select_option(
    state: web::Data<AppState>,
    principal: Principal,
    request: web::Json<SelectOptionRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let view = state
        .session_service
        .select_option(principal.as_str(), request.option_index)
        .await?;

    Ok(HttpResponse::Ok().json(view))
}

/// A duplicate submit while grading is in flight answers 202 rather than
/// erroring; browsers double-fire click handlers more often than one would
/// hope.
#[post("/api/sessions/submit")]
async fn submit_answer(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let response = state.session_service.submit(principal.as_str()).await?;

    if response.status == "grading" {
        return Ok(HttpResponse::Accepted().json(response));
    }
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/sessions/advance")]
async fn advance_session(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let view = state.session_service.advance(principal.as_str()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[get("/api/sessions/result")]
async fn session_result(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let result = state.session_service.result(principal.as_str()).await?;
    Ok(HttpResponse::Ok().json(AttemptResultDto::from(result)))
}

#[delete("/api/sessions")]
async fn abandon_session(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    state.session_service.abandon(principal.as_str()).await;
    Ok(HttpResponse::NoContent().finish())
}
