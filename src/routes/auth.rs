// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login and logout routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::Session;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    session: Session,
}

/// Cookies are only marked `Secure` when the frontend is served over HTTPS.
fn is_secure(frontend_url: &str) -> bool {
    frontend_url.starts_with("https://")
}

fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Check credentials, then hand out the session both as cookie and token.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let session = state.users.login(&body.username, &body.password).await?;

    let token = create_jwt(&session, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign session: {}", e)))?;

    let cookie = session_cookie(token.clone(), is_secure(&state.config.frontend_url));
    Ok((jar.add(cookie), Json(LoginResponse { token, session })))
}

/// Clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = session_cookie(String::new(), is_secure(&state.config.frontend_url));
    (jar.remove(removal), StatusCode::NO_CONTENT)
}
