// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use clan_ops::config::Config;
use clan_ops::db::{collections, MemoryStore, Store};
use clan_ops::middleware::auth::create_jwt;
use clan_ops::models::{Role, Session, User};
use clan_ops::routes::create_router;
use clan_ops::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test app backed by an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let store = Store::new(Arc::new(MemoryStore::new()));
    let state = Arc::new(AppState::new(config, store));
    (create_router(state.clone()), state)
}

/// Insert a user directly (no password hashing) and return its session.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, username: &str, rol: Role) -> Session {
    let user = User {
        username: username.to_string(),
        password_hash: "not-a-phc-string".to_string(),
        nombre: username.to_string(),
        apellido: "Test".to_string(),
        rol,
        activo: true,
        creado_en: chrono::Utc::now(),
    };
    let stored = state
        .store
        .insert(collections::USERS, &user)
        .await
        .expect("seed user");
    Session::for_user(&stored.id, &stored.doc)
}

/// The usual cast: a jefe, an encargado and two empleados.
#[allow(dead_code)]
pub struct Cast {
    pub jefe: Session,
    pub encargado: Session,
    pub empleado: Session,
    pub empleado2: Session,
}

#[allow(dead_code)]
pub async fn seed_cast(state: &AppState) -> Cast {
    Cast {
        jefe: seed_user(state, "jefe", Role::Jefe).await,
        encargado: seed_user(state, "sargento", Role::Encargado).await,
        empleado: seed_user(state, "prospect", Role::Empleado).await,
        empleado2: seed_user(state, "vendedor", Role::Empleado).await,
    }
}

/// Signed session token for a user.
#[allow(dead_code)]
pub fn token_for(state: &AppState, session: &Session) -> String {
    create_jwt(session, &state.config.jwt_signing_key).expect("sign jwt")
}

/// Send a JSON request and decode the JSON response (Null if empty).
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
