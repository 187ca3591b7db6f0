//! Product delivery routes.

use super::{records, Record};
use crate::error::Result;
use crate::models::{ProductDelivery, ProductLine, Session};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/entregas", get(list).post(create))
        .route("/api/entregas/{id}", delete(remove))
        .route("/api/entregas/{id}/confirmar", post(confirm))
        .route("/api/entregas/{id}/rechazar", post(reject))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliveryBody {
    vendedor_id: String,
    productos: Vec<ProductLine>,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Record<ProductDelivery>>>> {
    Ok(Json(records(state.deliveries.list_deliveries(&session).await?)))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateDeliveryBody>,
) -> Result<(StatusCode, Json<Record<ProductDelivery>>)> {
    let created = state
        .deliveries
        .create_delivery(&session, &body.vendedor_id, body.productos)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn confirm(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Record<ProductDelivery>>> {
    Ok(Json(state.deliveries.confirm_delivery(&session, &id).await?.into()))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Record<ProductDelivery>>> {
    Ok(Json(state.deliveries.reject_delivery(&session, &id).await?.into()))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.deliveries.delete_delivery(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
