// tests/router_tests.rs

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::test_state;
use quizhub::{config::SessionBackend, routes};
use tower::ServiceExt;

#[tokio::test]
async fn missing_cookie_is_unauthorized() {
    let app = routes::create_router(test_state(SessionBackend::Memory).await);

    let response = app
        .oneshot(Request::builder().uri("/scoreboard").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_session_id_is_unauthorized() {
    let app = routes::create_router(test_state(SessionBackend::Database).await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin")
                .header(header::COOKIE, "session=00000000-0000-0000-0000-000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let app = routes::create_router(test_state(SessionBackend::Memory).await);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
