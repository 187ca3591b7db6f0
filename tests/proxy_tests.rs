// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public proxy endpoint tests: Retell webhook signatures, outbound call
//! validation and the chat relay.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use clan_ops::config::Config;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tower::ServiceExt;

mod common;

fn signature(key: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

async fn post_webhook(app: &axum::Router, body: &str, sig: Option<&str>) -> StatusCode {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/retell/webhook")
        .header("content-type", "application/json");
    if let Some(sig) = sig {
        builder = builder.header("x-retell-signature", sig);
    }
    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_webhook_accepts_valid_signature() {
    let (app, _) = common::create_test_app();
    let body = r#"{"event":"call_started","call":{"call_id":"abc"}}"#;

    let status = post_webhook(&app, body, Some(&signature("test_retell_key", body))).await;
    assert_eq!(status, StatusCode::OK);

    // Events that would be forwarded still succeed without a chat webhook
    let ended = r#"{"event":"call_ended","call":{"call_id":"abc"}}"#;
    let status = post_webhook(&app, ended, Some(&signature("test_retell_key", ended))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_rejects_bad_or_missing_signature() {
    let (app, _) = common::create_test_app();
    let body = r#"{"event":"call_ended"}"#;

    let status = post_webhook(&app, body, Some(&signature("wrong_key", body))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let status = post_webhook(&app, body, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signature over a different body
    let other = r#"{"event":"call_analyzed"}"#;
    let status = post_webhook(&app, body, Some(&signature("test_retell_key", other))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_without_retell_config_is_unavailable() {
    let mut config = Config::test_default();
    config.retell = None;
    let (app, _) = common::create_test_app_with_config(config);

    let body = r#"{"event":"call_ended"}"#;
    let status = post_webhook(&app, body, Some(&signature("test_retell_key", body))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_create_call_validates_number() {
    let (app, _) = common::create_test_app();

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/retell/create-call",
        None,
        Some(json!({"toNumber": "600 111 222"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_create_call_without_config() {
    let mut config = Config::test_default();
    config.retell = None;
    let (app, _) = common::create_test_app_with_config(config);

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/retell/create-call",
        None,
        Some(json!({"toNumber": "+34600111222", "nombre": "Lamar"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "not_configured");
    assert_eq!(body["details"], "RETELL_API_KEY");
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let mut config = Config::test_default();
    config.chat_webhook_url = Some("http://127.0.0.1:9/hook".to_string());
    let (app, _) = common::create_test_app_with_config(config);

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/chat/send",
        None,
        Some(json!({"message": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/chat/send",
        None,
        Some(json!({"message": "x".repeat(2001)})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_without_webhook_is_unavailable() {
    let (app, _) = common::create_test_app();

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/chat/send",
        None,
        Some(json!({"message": "hola"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["details"], "CHAT_WEBHOOK_URL");
}
