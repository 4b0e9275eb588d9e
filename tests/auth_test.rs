use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_register_login_and_me() {
    let app = MockApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "login": "newcomer",
                "password": "secret",
                "first_name": "Иван"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], json!("newcomer"));
    assert_eq!(body["is_admin"], json!(false));
    assert_eq!(body["application_submitted"], json!(false));

    let (status, tokens) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "login": "newcomer", "password": "secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access_token = tokens["access_token"].as_str().unwrap().to_string();

    let (status, me) = app
        .send(Method::GET, "/api/auth/me", Some(&access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["login"], json!("newcomer"));
    assert_eq!(me["first_name"], json!("Иван"));
    assert_eq!(me["has_pending_application"], json!(false));
}

#[tokio::test]
async fn test_register_duplicate_login_conflicts() {
    let app = MockApp::new().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "login": "resident", "password": "whatever" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = MockApp::new().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "login": "resident", "password": "wrong" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_token_pair() {
    let app = MockApp::new().await;

    let (_, tokens) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "login": "resident", "password": "resident-pass" })),
        )
        .await;
    let access_token = tokens["access_token"].as_str().unwrap().to_string();
    let refresh_token = tokens["refresh_token"].as_str().unwrap().to_string();

    // An access token is not accepted by the refresh endpoint.
    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": access_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, new_tokens) = app
        .send(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(new_tokens["access_token"].is_string());
    assert!(new_tokens["refresh_token"].is_string());

    // A refresh token cannot be used as a bearer token.
    let (status, _) = app
        .send(Method::GET, "/api/auth/me", Some(&refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = MockApp::new().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/change_password",
            Some(&app.user_token),
            Some(json!({ "old_password": "resident-pass", "new_password": "fresh-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "login": "resident", "password": "resident-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "login": "resident", "password": "fresh-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
