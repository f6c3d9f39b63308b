use actix_web::{http::StatusCode, test, App};

use quizmill_server::handlers;

fn assert_error_status(status: StatusCode) {
    assert!(
        status.is_client_error() || status.is_server_error(),
        "Expected error status, got: {}",
        status
    );
}

#[actix_web::test]
async fn available_badges_needs_no_state_or_principal() {
    let app = test::init_service(App::new().service(handlers::available_badges)).await;

    let req = test::TestRequest::get()
        .uri("/api/badges/available")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let badges = body.as_array().expect("catalog serializes as an array");
    assert!(!badges.is_empty());
    for badge in badges {
        assert!(badge["id"].is_string());
        assert!(badge["rarity"].is_string());
    }
}

#[actix_web::test]
async fn profile_route_rejects_requests_without_a_principal() {
    let app = test::init_service(App::new().service(handlers::get_profile)).await;

    let req = test::TestRequest::get().uri("/api/profile").to_request();
    let resp = test::call_service(&app, req).await;

    assert_error_status(resp.status());
}

#[actix_web::test]
async fn record_attempt_endpoint_exists() {
    let app = test::init_service(App::new().service(handlers::record_attempt)).await;

    let req = test::TestRequest::post()
        .uri("/api/attempts")
        .insert_header(("X-Principal", "tester"))
        .set_json(serde_json::json!({
            "topic": "python",
            "correctCount": 3,
            "totalQuestions": 5
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    // Without application state this cannot succeed, but the route and
    // payload shape are accepted up to that point.
    assert_error_status(resp.status());
}

#[actix_web::test]
async fn generate_quiz_endpoint_exists() {
    let app = test::init_service(App::new().service(handlers::generate_quiz)).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-quiz")
        .set_json(serde_json::json!({ "topic": "python", "numQuestions": 5 }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_error_status(resp.status());
}
