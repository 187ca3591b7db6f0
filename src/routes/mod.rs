// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod auth;
pub mod deliveries;
pub mod deposits;
pub mod goals;
pub mod proxy;
pub mod tickets;
pub mod timeclock;
pub mod tuning;
pub mod users;
pub mod vests;
pub mod weapons;

use crate::db::Stored;
use crate::middleware::auth::require_auth;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// A stored document as returned to clients: its key plus its fields.
#[derive(Debug, Serialize)]
pub struct Record<T> {
    pub id: String,
    #[serde(flatten)]
    pub doc: T,
}

impl<T> From<Stored<T>> for Record<T> {
    fn from(stored: Stored<T>) -> Self {
        Self {
            id: stored.id,
            doc: stored.doc,
        }
    }
}

pub(crate) fn records<T>(stored: Vec<Stored<T>>) -> Vec<Record<T>> {
    stored.into_iter().map(Record::from).collect()
}

/// Body of the `.../rechazar` endpoints. The body itself is optional.
#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
    #[serde(default)]
    pub motivo: Option<String>,
}

impl RejectBody {
    pub(crate) fn motivo(body: Option<Json<RejectBody>>) -> Option<String> {
        body.and_then(|Json(b)| b.motivo)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

/// Body carrying a single quantity.
#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    pub cantidad: u32,
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(proxy::routes());

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(api::routes())
        .merge(users::routes())
        .merge(weapons::routes())
        .merge(vests::routes())
        .merge(deliveries::routes())
        .merge(tickets::routes())
        .merge(deposits::routes())
        .merge(timeclock::routes())
        .merge(goals::routes())
        .merge(tuning::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
