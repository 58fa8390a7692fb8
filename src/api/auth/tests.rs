use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
async fn signup_then_login_and_me() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "username": "maria.s",
                "full_name": "Maria S",
                "password": "correct-horse"
            })),
        ))
        .await
        .expect("signup");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["username"], "maria.s");
    assert!(body["user"].get("hashed_password").is_none());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "maria.s", "password": "correct-horse"})),
        ))
        .await
        .expect("login");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    let token = body["access_token"].as_str().expect("token").to_string();

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["full_name"], "Maria S");
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "taken_name", "First", "first-pass").await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "username": "taken_name",
                "full_name": "Second",
                "password": "second-pass"
            })),
        ))
        .await
        .expect("signup");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_validates_username_and_password() {
    let ctx = test_support::setup_test_context().await;

    for (username, password) in [("x", "long-enough"), ("valid_name", "short")] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/signup",
                None,
                Some(json!({"username": username, "full_name": "Someone", "password": password})),
            ))
            .await
            .expect("signup");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    }
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "login01", "Login User", "right-pass").await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "login01", "password": "wrong-pass"})),
        ))
        .await
        .expect("login");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "response: {body}");
    assert_eq!(body["error"], "Incorrect username or password");
}

#[tokio::test]
async fn login_is_rate_limited() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "burst01", "Burst", "right-pass").await;

    let mut last_status = StatusCode::OK;
    for _ in 0..11 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"username": "burst01", "password": "wrong-pass"})),
            ))
            .await
            .expect("login");
        last_status = response.status();
    }

    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
}
