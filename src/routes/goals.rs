// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Sales goal routes.

use super::timeclock::parse_date;
use crate::error::Result;
use crate::models::{Goal, GoalPeriod, Session};
use crate::time_utils::civil_date;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/metas/rebuild", post(rebuild))
        .route("/api/metas/{user_id}", get(get_goal).put(set_target))
}

#[derive(Deserialize)]
pub struct GoalQuery {
    #[serde(default)]
    periodo: Option<String>,
    /// Any date inside the period; defaults to today (civil)
    #[serde(default)]
    fecha: Option<String>,
}

#[derive(Deserialize)]
pub struct SetTargetBody {
    periodo: String,
    #[serde(default)]
    fecha: Option<String>,
    objetivo: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalResponse {
    #[serde(flatten)]
    goal: Goal,
    progreso: Option<f64>,
}

impl From<Goal> for GoalResponse {
    fn from(goal: Goal) -> Self {
        Self {
            progreso: goal.progress(),
            goal,
        }
    }
}

#[derive(Serialize)]
pub struct RebuildResponse {
    added: usize,
}

fn resolve(state: &AppState, periodo: Option<&str>, fecha: Option<&str>) -> Result<(GoalPeriod, NaiveDate)> {
    let period = match periodo {
        Some(p) => p.parse()?,
        None => GoalPeriod::Diaria,
    };
    let date = match fecha {
        Some(f) => parse_date(f)?,
        None => civil_date(Utc::now(), state.config.civil_tz()),
    };
    Ok((period, date))
}

async fn get_goal(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<String>,
    Query(query): Query<GoalQuery>,
) -> Result<Json<GoalResponse>> {
    let (period, date) = resolve(&state, query.periodo.as_deref(), query.fecha.as_deref())?;
    let goal = state
        .goals
        .goal_for(&session, &user_id, period, date)
        .await?;
    Ok(Json(goal.into()))
}

async fn set_target(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<String>,
    Json(body): Json<SetTargetBody>,
) -> Result<Json<GoalResponse>> {
    let (period, date) = resolve(&state, Some(&body.periodo), body.fecha.as_deref())?;
    let goal = state
        .goals
        .set_target(&session, &user_id, period, date, body.objetivo)
        .await?;
    Ok(Json(goal.doc.into()))
}

async fn rebuild(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<RebuildResponse>> {
    let added = state.goals.rebuild_ledger(&session).await?;
    Ok(Json(RebuildResponse { added }))
}
