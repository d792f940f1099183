//! Auth-gate and request validation behavior, verified against the real
//! router without a database.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let app = common::create_test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn trips_require_a_token() {
    let app = common::create_test_app();
    let response = app.oneshot(get("/trips")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn activity_requires_a_token() {
    let app = common::create_test_app();
    let response = app.oneshot(get("/activity")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = common::create_test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/trips")
        .header(header::AUTHORIZATION, "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_scheme_is_rejected() {
    let app = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4());
    let request = Request::builder()
        .method("GET")
        .uri("/trips")
        .header(header::AUTHORIZATION, format!("Basic {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_malformed_email() {
    let app = common::create_test_app();
    let body = r#"{"email":"not-an-email","username":"alice","password":"secret1"}"#;
    let response = app.oneshot(post_json("/auth/register", None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = common::create_test_app();
    let body = r#"{"email":"alice@example.com","username":"alice","password":"short"}"#;
    let response = app.oneshot(post_json("/auth/register", None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_bad_username() {
    let app = common::create_test_app();
    let body = r#"{"email":"alice@example.com","username":"a","password":"secret1"}"#;
    let response = app.oneshot(post_json("/auth/register", None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn decline_note_over_limit_is_rejected() {
    let app = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4());
    let note = "x".repeat(201);
    let body = format!(r#"{{"note":"{}"}}"#, note);
    let uri = format!("/payments/{}/decline", Uuid::new_v4());
    let response = app
        .oneshot(post_json(&uri, Some(&token), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
