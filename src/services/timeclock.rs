// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time clock with weekly aggregation.
//!
//! A shift that crosses Monday 00:00 (civil time) is split at every week
//! boundary it crosses. The week the shift started in is credited with
//! `horas_semana_actual`; everything after goes to `horas_semana_siguiente`.
//! Each weekly summary remembers which entries it has counted so a repeated
//! aggregation never double counts.

use crate::db::{collections, FieldFilter, Store, Stored};
use crate::error::{AppError, Result};
use crate::models::{Session, TimeClockEntry, WeeklySummary};
use crate::services::guard::require_self_or_privileged;
use crate::time_utils::{civil_midnight, hours_between, monday_of, week_start};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// Hours of a shift that fall into one civil week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekShare {
    pub semana_inicio: NaiveDate,
    pub horas: f64,
}

/// Split `[entrada, salida)` at every civil Monday 00:00.
///
/// Always returns at least one share, so a zero-length shift is still
/// attributed to the week it started in.
pub fn split_by_week(
    entrada: DateTime<Utc>,
    salida: DateTime<Utc>,
    tz: Tz,
) -> Vec<WeekShare> {
    let mut shares = Vec::new();
    let mut cursor = entrada;

    while cursor < salida {
        let week = week_start(cursor, tz);
        let boundary = civil_midnight(week + Duration::days(7), tz);
        let end = boundary.min(salida);
        shares.push(WeekShare {
            semana_inicio: week,
            horas: hours_between(cursor, end),
        });
        cursor = end;
    }

    if shares.is_empty() {
        shares.push(WeekShare {
            semana_inicio: week_start(entrada, tz),
            horas: 0.0,
        });
    }
    shares
}

#[derive(Clone)]
pub struct TimeClockService {
    store: Store,
    tz: Tz,
}

impl TimeClockService {
    pub fn new(store: Store, tz: Tz) -> Self {
        Self { store, tz }
    }

    async fn open_entry(&self, user_id: &str) -> Result<Option<Stored<TimeClockEntry>>> {
        let mut open: Vec<Stored<TimeClockEntry>> = self
            .store
            .find_eq(
                collections::TIME_ENTRIES,
                &[
                    FieldFilter::eq("userId", user_id),
                    FieldFilter::eq("completado", false),
                ],
            )
            .await?;
        if open.len() > 1 {
            tracing::warn!(user_id, count = open.len(), "Multiple open time clock entries");
        }
        open.sort_by(|a, b| b.doc.entrada.cmp(&a.doc.entrada));
        Ok(open.into_iter().next())
    }

    pub async fn clock_in(&self, session: &Session) -> Result<Stored<TimeClockEntry>> {
        self.clock_in_at(session, Utc::now()).await
    }

    pub async fn clock_in_at(
        &self,
        session: &Session,
        at: DateTime<Utc>,
    ) -> Result<Stored<TimeClockEntry>> {
        if let Some(open) = self.open_entry(&session.id).await? {
            return Err(AppError::InvalidState(format!(
                "you are already clocked in since {}",
                crate::time_utils::format_utc_rfc3339(open.doc.entrada)
            )));
        }

        let entry = TimeClockEntry {
            user_id: session.id.clone(),
            user_nombre: session.display_name(),
            entrada: at,
            salida: None,
            horas_totales: 0.0,
            horas_semana_actual: 0.0,
            horas_semana_siguiente: 0.0,
            semana_inicio: week_start(at, self.tz),
            completado: false,
        };

        let stored = self.store.insert(collections::TIME_ENTRIES, &entry).await?;
        tracing::info!(entry_id = %stored.id, user_id = %session.id, "Clocked in");
        Ok(stored)
    }

    pub async fn clock_out(&self, session: &Session) -> Result<Stored<TimeClockEntry>> {
        self.clock_out_at(session, Utc::now()).await
    }

    pub async fn clock_out_at(
        &self,
        session: &Session,
        at: DateTime<Utc>,
    ) -> Result<Stored<TimeClockEntry>> {
        let open = self
            .open_entry(&session.id)
            .await?
            .ok_or_else(|| AppError::NotFound("no open time clock entry".to_string()))?;

        if at < open.doc.entrada {
            return Err(AppError::Validation(
                "clock-out time precedes clock-in time".to_string(),
            ));
        }

        let shares = split_by_week(open.doc.entrada, at, self.tz);
        let actual = shares.first().map(|s| s.horas).unwrap_or(0.0);
        let siguiente: f64 = shares.iter().skip(1).map(|s| s.horas).sum();

        // Weeks first: the entry stays open until every week holds its
        // hours, so a failed clock-out can simply be retried.
        for share in &shares {
            self.credit_week(&session.id, &open.id, share).await?;
        }

        let closed = self
            .store
            .update(
                collections::TIME_ENTRIES,
                &open.id,
                "Time clock entry",
                |e: &mut TimeClockEntry| {
                    if e.completado {
                        return Err(AppError::InvalidState(
                            "this time clock entry is already closed".to_string(),
                        ));
                    }
                    e.salida = Some(at);
                    e.horas_totales = actual + siguiente;
                    e.horas_semana_actual = actual;
                    e.horas_semana_siguiente = siguiente;
                    e.completado = true;
                    Ok(())
                },
            )
            .await?;

        tracing::info!(
            entry_id = %closed.id,
            user_id = %session.id,
            horas = closed.doc.horas_totales,
            weeks = shares.len(),
            "Clocked out"
        );
        Ok(closed)
    }

    async fn credit_week(&self, user_id: &str, entry_id: &str, share: &WeekShare) -> Result<()> {
        let key = WeeklySummary::key(user_id, share.semana_inicio);

        if self
            .store
            .get::<WeeklySummary>(collections::WEEKS, &key)
            .await?
            .is_none()
        {
            let mut fresh = WeeklySummary::empty(user_id, share.semana_inicio);
            fresh.add_entry(entry_id, share.horas);
            match self
                .store
                .insert_with_id(collections::WEEKS, &key, &fresh)
                .await
            {
                Ok(_) => return Ok(()),
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e),
            }
        }

        self.store
            .update(collections::WEEKS, &key, "Weekly summary", |w: &mut WeeklySummary| {
                if !w.add_entry(entry_id, share.horas) {
                    tracing::debug!(entry_id, week = %share.semana_inicio, "Entry already counted");
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Entries for `user_id` (default: the caller), newest first.
    pub async fn list_entries(
        &self,
        session: &Session,
        user_id: Option<&str>,
    ) -> Result<Vec<Stored<TimeClockEntry>>> {
        let user_id = user_id.unwrap_or(session.id.as_str());
        require_self_or_privileged(session, user_id, "view time clock entries")?;

        let mut entries: Vec<Stored<TimeClockEntry>> = self
            .store
            .find_eq(
                collections::TIME_ENTRIES,
                &[FieldFilter::eq("userId", user_id)],
            )
            .await?;
        entries.sort_by(|a, b| b.doc.entrada.cmp(&a.doc.entrada));
        Ok(entries)
    }

    /// Summary for the week containing `date`; empty if nothing was recorded.
    pub async fn weekly_summary(
        &self,
        session: &Session,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<WeeklySummary> {
        require_self_or_privileged(session, user_id, "view weekly summaries")?;

        let monday = monday_of(date);
        Ok(self
            .store
            .get::<WeeklySummary>(collections::WEEKS, &WeeklySummary::key(user_id, monday))
            .await?
            .map(|s| s.doc)
            .unwrap_or_else(|| WeeklySummary::empty(user_id, monday)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Role;
    use chrono::TimeZone;
    use std::sync::Arc;

    const MADRID: Tz = chrono_tz::Europe::Madrid;

    fn civil(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        MADRID
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn worker() -> Session {
        Session {
            id: "w1".to_string(),
            username: "w1".to_string(),
            nombre: "Lamar".to_string(),
            apellido: "Davis".to_string(),
            rol: Role::Empleado,
        }
    }

    #[test]
    fn test_split_across_monday_midnight() {
        // Sunday 2026-03-08 23:00 to Monday 2026-03-09 01:00, civil
        let shares = split_by_week(civil(2026, 3, 8, 23), civil(2026, 3, 9, 1), MADRID);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].semana_inicio, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert!((shares[0].horas - 1.0).abs() < 1e-9);
        assert_eq!(shares[1].semana_inicio, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert!((shares[1].horas - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_within_one_week() {
        let shares = split_by_week(civil(2026, 3, 4, 9), civil(2026, 3, 4, 17), MADRID);
        assert_eq!(shares.len(), 1);
        assert!((shares[0].horas - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_spanning_two_boundaries() {
        let shares = split_by_week(civil(2026, 3, 8, 12), civil(2026, 3, 16, 12), MADRID);
        assert_eq!(shares.len(), 3);
        let total: f64 = shares.iter().map(|s| s.horas).sum();
        assert!((total - 192.0).abs() < 1e-9);
        assert!((shares[1].horas - 168.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_shift() {
        let at = civil(2026, 3, 4, 9);
        let shares = split_by_week(at, at, MADRID);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].horas, 0.0);
    }

    #[tokio::test]
    async fn test_clock_cycle_updates_both_weeks() {
        let service = TimeClockService::new(Store::new(Arc::new(MemoryStore::new())), MADRID);
        let session = worker();

        service
            .clock_in_at(&session, civil(2026, 3, 8, 23))
            .await
            .unwrap();
        assert!(matches!(
            service.clock_in_at(&session, civil(2026, 3, 8, 23)).await,
            Err(AppError::InvalidState(_))
        ));

        let closed = service
            .clock_out_at(&session, civil(2026, 3, 9, 1))
            .await
            .unwrap();
        assert!(closed.doc.completado);
        assert!((closed.doc.horas_semana_actual - 1.0).abs() < 1e-9);
        assert!((closed.doc.horas_semana_siguiente - 1.0).abs() < 1e-9);
        assert!((closed.doc.horas_totales - 2.0).abs() < 1e-9);

        let first = service
            .weekly_summary(&session, "w1", NaiveDate::from_ymd_opt(2026, 3, 8).unwrap())
            .await
            .unwrap();
        let second = service
            .weekly_summary(&session, "w1", NaiveDate::from_ymd_opt(2026, 3, 9).unwrap())
            .await
            .unwrap();
        assert!((first.horas_totales - 1.0).abs() < 1e-9);
        assert!((second.horas_totales - 1.0).abs() < 1e-9);
        assert_eq!(first.fichajes, vec![closed.id.clone()]);

        // Re-crediting the same entry is a no-op
        service
            .credit_week("w1", &closed.id, &WeekShare {
                semana_inicio: second.semana_inicio,
                horas: 1.0,
            })
            .await
            .unwrap();
        let again = service
            .weekly_summary(&session, "w1", second.semana_inicio)
            .await
            .unwrap();
        assert!((again.horas_totales - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_clock_out_without_open_entry() {
        let service = TimeClockService::new(Store::new(Arc::new(MemoryStore::new())), MADRID);
        assert!(matches!(
            service.clock_out(&worker()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_split_at_summer_time_monday() {
        // Sunday 2026-07-05 23:00 to Monday 01:00, civil (CEST)
        let shares = split_by_week(civil(2026, 7, 5, 23), civil(2026, 7, 6, 1), MADRID);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[1].semana_inicio, NaiveDate::from_ymd_opt(2026, 7, 6).unwrap());
        assert!((shares[0].horas - 1.0).abs() < 1e-9);
        assert!((shares[1].horas - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_credit_leaves_entry_open_for_retry() {
        let store = Store::new(Arc::new(MemoryStore::new()));
        let service = TimeClockService::new(store.clone(), MADRID);
        let session = worker();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let week_key = WeeklySummary::key("w1", monday);

        store
            .insert_with_id(
                collections::WEEKS,
                &week_key,
                &serde_json::json!({"horasTotales": "not a number"}),
            )
            .await
            .unwrap();

        let entry = service
            .clock_in_at(&session, civil(2026, 3, 4, 9))
            .await
            .unwrap();
        assert!(matches!(
            service.clock_out_at(&session, civil(2026, 3, 4, 17)).await,
            Err(AppError::Database(_))
        ));

        let still_open: Stored<TimeClockEntry> = store
            .require(collections::TIME_ENTRIES, &entry.id, "entry")
            .await
            .unwrap();
        assert!(!still_open.doc.completado);

        store.delete(collections::WEEKS, &week_key).await.unwrap();
        let closed = service
            .clock_out_at(&session, civil(2026, 3, 4, 17))
            .await
            .unwrap();
        assert!(closed.doc.completado);

        let week = service
            .weekly_summary(&session, "w1", monday)
            .await
            .unwrap();
        assert!((week.horas_totales - 8.0).abs() < 1e-9);
        assert_eq!(week.fichajes, vec![entry.id]);
    }
}
