//! Tuning quote and job routes.

use super::{records, Record};
use crate::error::Result;
use crate::models::{Session, TuningJob};
use crate::services::pricing::PriceBreakdown;
use crate::services::tuning::TuningOrder;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tuneos", get(list).post(register))
        .route("/api/tuneos/precio", post(quote))
}

/// Price a job without recording it.
async fn quote(Json(order): Json<TuningOrder>) -> Result<Json<PriceBreakdown>> {
    Ok(Json(order.quote()?))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(order): Json<TuningOrder>,
) -> Result<(StatusCode, Json<Record<TuningJob>>)> {
    let job = state.tuning.register_tuning(&session, order).await?;
    Ok((StatusCode::CREATED, Json(job.into())))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Record<TuningJob>>>> {
    Ok(Json(records(state.tuning.list_tunings(&session).await?)))
}
