// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time clock and weekly summary routes.

use super::{records, Record};
use crate::error::{AppError, Result};
use crate::models::{Session, TimeClockEntry, WeeklySummary};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/fichajes", get(list_entries))
        .route("/api/fichajes/entrada", post(clock_in))
        .route("/api/fichajes/salida", post(clock_out))
        .route("/api/semanas/{user_id}/{week_start}", get(weekly_summary))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesQuery {
    #[serde(default)]
    user_id: Option<String>,
}

/// Parse a `YYYY-MM-DD` path or query value.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("'{}' is not a YYYY-MM-DD date", raw)))
}

async fn clock_in(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<(StatusCode, Json<Record<TimeClockEntry>>)> {
    let entry = state.timeclock.clock_in(&session).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

async fn clock_out(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Record<TimeClockEntry>>> {
    Ok(Json(state.timeclock.clock_out(&session).await?.into()))
}

async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<Record<TimeClockEntry>>>> {
    let entries = state
        .timeclock
        .list_entries(&session, query.user_id.as_deref())
        .await?;
    Ok(Json(records(entries)))
}

async fn weekly_summary(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path((user_id, week_start)): Path<(String, String)>,
) -> Result<Json<WeeklySummary>> {
    let date = parse_date(&week_start)?;
    Ok(Json(
        state
            .timeclock
            .weekly_summary(&session, &user_id, date)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-03-09").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
        );
        assert!(matches!(parse_date("09/03/2026"), Err(AppError::Validation(_))));
    }
}
