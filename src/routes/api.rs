// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::models::{Role, Session};
use crate::services::Capabilities;
use crate::AppState;
use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me))
}

/// Current user response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub nombre: String,
    pub apellido: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub rol: Role,
    pub is_privileged: bool,
    pub is_requester: bool,
}

/// Get the current session and what it may do.
async fn get_me(Extension(session): Extension<Session>) -> Json<MeResponse> {
    let caps = Capabilities::of(&session);
    Json(MeResponse {
        id: session.id,
        username: session.username,
        nombre: session.nombre,
        apellido: session.apellido,
        rol: session.rol,
        is_privileged: caps.is_privileged,
        is_requester: caps.is_requester,
    })
}
