//! Standalone vest request routes.

use super::{records, QuantityBody, Record};
use crate::error::Result;
use crate::models::{Session, VestRequest};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chalecos", get(list).post(request_vests))
        .route("/api/chalecos/{id}/aprobar", post(approve))
        .route("/api/chalecos/{id}/rechazar", post(reject))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Record<VestRequest>>>> {
    Ok(Json(records(state.vests.list(&session).await?)))
}

async fn request_vests(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<QuantityBody>,
) -> Result<(StatusCode, Json<Record<VestRequest>>)> {
    let filed = state.vests.request_vests(&session, body.cantidad).await?;
    Ok((StatusCode::CREATED, Json(filed.into())))
}

async fn approve(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Record<VestRequest>>> {
    Ok(Json(state.vests.approve(&session, &id).await?.into()))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Record<VestRequest>>> {
    Ok(Json(state.vests.reject(&session, &id).await?.into()))
}
