// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Cash ticket routes.

use super::{records, Record, RejectBody};
use crate::error::Result;
use crate::models::{CashTicket, Session};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tickets", get(list).post(create))
        .route("/api/tickets/{id}/confirmar-cantidad", post(confirm_amount))
        .route("/api/tickets/{id}/confirmar-recepcion", post(confirm_receipt))
        .route("/api/tickets/{id}/rechazar", post(reject))
}

/// The counterpart is the seller when a dealer opens the ticket, and the
/// dealer when a seller does.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketBody {
    contraparte_id: String,
    cantidad: u64,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Record<CashTicket>>>> {
    Ok(Json(records(state.tickets.list_tickets(&session).await?)))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateTicketBody>,
) -> Result<(StatusCode, Json<Record<CashTicket>>)> {
    let created = state
        .tickets
        .create_ticket(&session, &body.contraparte_id, body.cantidad)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn confirm_amount(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Record<CashTicket>>> {
    Ok(Json(state.tickets.confirm_amount(&session, &id).await?.into()))
}

async fn confirm_receipt(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Record<CashTicket>>> {
    Ok(Json(state.tickets.confirm_receipt(&session, &id).await?.into()))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    body: Option<Json<RejectBody>>,
) -> Result<Json<Record<CashTicket>>> {
    let motivo = RejectBody::motivo(body);
    Ok(Json(
        state
            .tickets
            .reject_ticket(&session, &id, motivo)
            .await?
            .into(),
    ))
}
