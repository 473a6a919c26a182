use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use crate::common::{create_test_token, get_authed, test_app_rate_limited};

#[tokio::test]
async fn requests_over_limit_get_429() {
    let (app, _pool, _guard) = test_app_rate_limited(2).await;

    let token = create_test_token("teacher");

    let (status, _) = get_authed(&app, "/api/v1/students", &token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_authed(&app, "/api/v1/students", &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, resp) = get_authed(&app, "/api/v1/students", &token).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp["kind"], "RateLimited");
}

#[tokio::test]
async fn separate_clients_have_separate_budgets() {
    let (app, _pool, _guard) = test_app_rate_limited(1).await;

    let token = create_test_token("teacher");
    let request_from = |ip: &str| {
        Request::builder()
            .uri("/api/v1/students")
            .header("Authorization", format!("Bearer {}", token))
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(request_from("10.1.1.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A different client IP still has its own budget
    let response = app.clone().oneshot(request_from("10.2.2.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(request_from("10.1.1.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn rate_limit_applies_before_auth_checks() {
    let (app, _pool, _guard) = test_app_rate_limited(1).await;

    // Unauthenticated requests burn budget too: the first gets a 401
    // from the handler, the second never reaches it
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/students")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/students")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
