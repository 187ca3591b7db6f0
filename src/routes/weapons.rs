// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weapon issuance and weapon-linked request routes.

use super::{records, QuantityBody, Record, RejectBody};
use crate::error::Result;
use crate::models::{LossReason, Session, WeaponIssuance, WeaponRequest, WeaponType};
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
        .route("/api/armas", get(list_weapons).post(issue_weapon))
        .route("/api/armas/{id}/perdida", post(mark_lost))
        .route("/api/armas/{id}/solicitudes", get(list_requests))
        .route("/api/armas/{id}/balas", post(request_ammo))
        .route("/api/armas/{id}/chalecos", post(request_vest))
        .route("/api/solicitudes-arma/{id}/entregar", post(deliver_request))
        .route("/api/solicitudes-arma/{id}/rechazar", post(reject_request))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueWeaponBody {
    prospect_id: String,
    tipo_arma: String,
}

#[derive(Deserialize)]
pub struct MarkLostBody {
    motivo: String,
}

async fn list_weapons(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Record<WeaponIssuance>>>> {
    Ok(Json(records(state.weapons.list_weapons(&session).await?)))
}

async fn issue_weapon(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<IssueWeaponBody>,
) -> Result<(StatusCode, Json<Record<WeaponIssuance>>)> {
    let tipo: WeaponType = body.tipo_arma.parse()?;
    let issued = state
        .weapons
        .issue_weapon(&session, &body.prospect_id, tipo)
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

async fn mark_lost(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<MarkLostBody>,
) -> Result<Json<Record<WeaponIssuance>>> {
    let reason: LossReason = body.motivo.parse()?;
    Ok(Json(state.weapons.mark_lost(&session, &id, reason).await?.into()))
}

async fn list_requests(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Record<WeaponRequest>>>> {
    Ok(Json(records(state.weapons.list_requests(&session, &id).await?)))
}

async fn request_ammo(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<QuantityBody>,
) -> Result<(StatusCode, Json<Record<WeaponRequest>>)> {
    let filed = state
        .weapons
        .request_ammo(&session, &id, body.cantidad)
        .await?;
    Ok((StatusCode::CREATED, Json(filed.into())))
}

async fn request_vest(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<QuantityBody>,
) -> Result<(StatusCode, Json<Record<WeaponRequest>>)> {
    let filed = state
        .weapons
        .request_vest(&session, &id, body.cantidad)
        .await?;
    Ok((StatusCode::CREATED, Json(filed.into())))
}

async fn deliver_request(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Record<WeaponRequest>>> {
    Ok(Json(state.weapons.deliver_request(&session, &id).await?.into()))
}

async fn reject_request(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    body: Option<Json<RejectBody>>,
) -> Result<Json<Record<WeaponRequest>>> {
    let motivo = RejectBody::motivo(body);
    Ok(Json(
        state
            .weapons
            .reject_request(&session, &id, motivo)
            .await?
            .into(),
    ))
}
