//! Cash deposit routes.

use super::{records, Record};
use crate::error::Result;
use crate::models::{CashDeposit, Session};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/depositos", get(list).post(create))
        .route("/api/depositos/{id}/aprobar", post(approve))
        .route("/api/depositos/{id}/rechazar", post(reject))
}

#[derive(Deserialize)]
pub struct CreateDepositBody {
    detalles: BTreeMap<String, u64>,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Record<CashDeposit>>>> {
    Ok(Json(records(state.deposits.list_deposits(&session).await?)))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateDepositBody>,
) -> Result<(StatusCode, Json<Record<CashDeposit>>)> {
    let created = state.deposits.create_deposit(&session, body.detalles).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn approve(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Record<CashDeposit>>> {
    Ok(Json(state.deposits.approve_deposit(&session, &id).await?.into()))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Record<CashDeposit>>> {
    Ok(Json(state.deposits.reject_deposit(&session, &id).await?.into()))
}
