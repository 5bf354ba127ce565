mod common;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
};
use common::{test_config, TestApp, TEST_PASSWORD};
use lab_service::models::Role;
use serde_json::json;
use std::net::SocketAddr;

#[tokio::test]
async fn test_register_returns_token_with_baseline_role() {
    let app = TestApp::spawn();

    let token = app.register("ana@gmail.com", None).await;

    let claims = app.state.jwt.verify(&token).unwrap();
    assert_eq!(claims.sub, "ana@gmail.com");
    assert_eq!(claims.roles, vec![Role::Academico]);
}

#[tokio::test]
async fn test_register_with_requested_roles() {
    let app = TestApp::spawn();

    let token = app
        .register("prof@gmail.com", Some(vec![Role::Professor, Role::Admin]))
        .await;

    let claims = app.state.jwt.verify(&token).unwrap();
    assert_eq!(claims.roles, vec![Role::Professor, Role::Admin]);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app = TestApp::spawn();
    app.register("ana@gmail.com", None).await;

    let res = app
        .post(
            "/api/auth/register",
            None,
            json!({ "gmail": "ana@gmail.com", "nome": "Outra Ana", "senha": "outrasenha" }),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["status"], 400);
    assert_eq!(res.body["error"], "Identifier already registered");

    // The original password still works
    assert_eq!(app.login("ana@gmail.com", TEST_PASSWORD).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let app = TestApp::spawn();

    let res = app
        .post(
            "/api/auth/register",
            None,
            json!({ "gmail": "not-an-email", "nome": "A", "senha": "123" }),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["status"], 400);
    let errors = res.body["errors"].as_object().expect("field errors");
    assert!(errors.contains_key("gmail"));
    assert!(errors.contains_key("nome"));
    assert!(errors.contains_key("senha"));
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let app = TestApp::spawn();

    let res = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"gmail\": "))
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["error"].as_str().unwrap().starts_with("Json parse error"));
}

#[tokio::test]
async fn test_login_returns_token_with_persisted_roles() {
    let app = TestApp::spawn();
    app.register("prof@gmail.com", Some(vec![Role::Professor])).await;

    let res = app.login("prof@gmail.com", TEST_PASSWORD).await;

    assert_eq!(res.status, StatusCode::OK);
    let token = res.body["token"].as_str().unwrap();
    let claims = app.state.jwt.verify(token).unwrap();
    assert_eq!(claims.sub, "prof@gmail.com");
    assert_eq!(claims.roles, vec![Role::Professor]);
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let app = TestApp::spawn();
    app.register("ana@gmail.com", None).await;

    let wrong_password = app.login("ana@gmail.com", "senhaerrada").await;
    let unknown_user = app.login("ghost@gmail.com", TEST_PASSWORD).await;

    assert_eq!(wrong_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_user.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.body["error"], "Invalid credentials");
}

fn login_attempt(peer: [u8; 4], forwarded_for: &str) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(
            json!({ "gmail": "ana@gmail.com", "senha": "qualquer" }).to_string(),
        ))
        .unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 50000))));
    req
}

#[tokio::test]
async fn test_login_is_rate_limited_per_peer() {
    let mut config = test_config();
    config.rate_limit.login_attempts = 2;
    config.rate_limit.login_window_seconds = 3600;
    let app = TestApp::spawn_with(config);

    let peer = [10, 0, 0, 1];
    assert_eq!(
        app.send(login_attempt(peer, "203.0.113.1")).await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.send(login_attempt(peer, "203.0.113.1")).await.status,
        StatusCode::BAD_REQUEST
    );

    let limited = app.send(login_attempt(peer, "203.0.113.1")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers.contains_key(header::RETRY_AFTER));

    // Other peers are unaffected
    assert_eq!(
        app.send(login_attempt([10, 0, 0, 2], "203.0.113.1")).await.status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_escape_login_limit() {
    let mut config = test_config();
    config.rate_limit.login_attempts = 2;
    config.rate_limit.login_window_seconds = 3600;
    let app = TestApp::spawn_with(config);

    let mut limited = 0;
    for n in 0..20 {
        let res = app
            .send(login_attempt([10, 0, 0, 1], &format!("198.51.100.{}", n)))
            .await;
        if res.status == StatusCode::TOO_MANY_REQUESTS {
            limited += 1;
        }
    }

    assert_eq!(limited, 18);
}

#[tokio::test]
async fn test_stored_password_is_hashed() {
    let app = TestApp::spawn();
    app.register("ana@gmail.com", None).await;

    let accounts = lab_service::services::AccountStore::list_accounts(app.store.as_ref())
        .await
        .unwrap();
    assert_eq!(accounts.len(), 1);
    assert_ne!(accounts[0].password_hash, TEST_PASSWORD);
    assert!(accounts[0].password_hash.starts_with("$argon2"));
}
