use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use quizmill_server::{app_state::AppState, config::Config, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if matches!(std::env::var("APP_ENV").as_deref(), Ok("production")) {
        config.validate_for_production();
    }

    let host = config.web_server_host.clone();
    let port = config.web_server_port;
    let allowed_origin = config.allowed_origin.clone();

    let state = AppState::new(config)
        .await
        .expect("failed to initialise application state");

    log::info!("Starting HTTP server on {}:{}", host, port);
    log::info!(
        "Question generation configured: {}",
        state.model_service.api_key_configured()
    );

    HttpServer::new(move || {
        let cors = match &allowed_origin {
            Some(origin) => Cors::default().allowed_origin(origin),
            None => Cors::default().allow_any_origin(),
        }
        .allowed_methods(vec!["GET", "POST", "DELETE"])
        .allowed_headers(vec!["Content-Type", "Authorization", "X-Principal"])
        .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .wrap(cors)
            .service(handlers::generate_quiz)
            .service(handlers::grade_answer)
            .service(handlers::ai_tutor)
            .service(handlers::start_session)
            .service(handlers::current_session)
            .service(handlers::select_option)
            .service(handlers::submit_answer)
            .service(handlers::advance_session)
            .service(handlers::session_result)
            .service(handlers::abandon_session)
            .service(handlers::get_profile)
            .service(handlers::get_badges)
            .service(handlers::available_badges)
            .service(handlers::badge_count)
            .service(handlers::record_attempt)
            .service(handlers::leaderboard)
            .service(handlers::topic_leaderboard)
            .service(handlers::quiz_stats)
            .service(handlers::dashboard_updates)
            .service(handlers::health_check)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
