// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Sales goals.
//!
//! The ledger in `metas_eventos` is the only source of truth: one event per
//! confirmed ticket, keyed by the ticket's document id so appending twice is a
//! no-op. Goal documents are recomputed from the ledger on every refresh and
//! are never incremented in place, so a retried refresh cannot drift.

use crate::db::{collections, FieldFilter, Store, Stored};
use crate::error::{AppError, Result};
use crate::models::{CashTicket, Goal, GoalEvent, GoalPeriod, Session, TicketStatus};
use crate::services::guard::{require_jefe, require_privileged, require_self_or_privileged};
use crate::time_utils::{civil_date, monday_of, week_start};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Attempts made to write a contended goal document.
const MAX_GOAL_WRITE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct GoalService {
    store: Store,
    tz: Tz,
}

/// Ledger totals for one user and period.
#[derive(Debug, Default, Clone, PartialEq)]
struct LedgerTotals {
    amount: u64,
    tickets: Vec<u64>,
}

/// Period key containing a civil date.
pub fn period_key(period: GoalPeriod, date: NaiveDate) -> NaiveDate {
    match period {
        GoalPeriod::Diaria => date,
        GoalPeriod::Semanal => monday_of(date),
    }
}

/// Sum of confirmed tickets for `user` whose dealer confirmation falls in
/// `[from, to)`.
pub fn derive_total_from_tickets(
    tickets: &[CashTicket],
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> u64 {
    tickets
        .iter()
        .filter(|t| t.estado == TicketStatus::Confirmado && t.vendedor_id == user_id)
        .filter(|t| {
            t.fecha_confirmacion_dealer
                .is_some_and(|at| at >= from && at < to)
        })
        .fold(0u64, |acc, t| acc.saturating_add(t.cantidad))
}

impl GoalService {
    pub fn new(store: Store, tz: Tz) -> Self {
        Self { store, tz }
    }

    /// Append the ledger event for a confirmed ticket and refresh the
    /// seller's daily and weekly goals. Returns `false` if the ticket was
    /// already in the ledger.
    pub async fn record_confirmed_ticket(&self, ticket: &Stored<CashTicket>) -> Result<bool> {
        if ticket.doc.estado != TicketStatus::Confirmado {
            return Err(AppError::InvalidState(format!(
                "ticket {} is {}, only confirmed tickets count towards goals",
                ticket.doc.ticket_id, ticket.doc.estado
            )));
        }

        let confirmado_en = ticket.doc.fecha_confirmacion_dealer.unwrap_or_else(Utc::now);
        let event = GoalEvent {
            ticket_id: ticket.doc.ticket_id,
            vendedor_id: ticket.doc.vendedor_id.clone(),
            cantidad: ticket.doc.cantidad,
            confirmado_en,
            dia: civil_date(confirmado_en, self.tz),
            semana: week_start(confirmado_en, self.tz),
        };

        let appended = match self
            .store
            .insert_with_id(collections::GOAL_EVENTS, &ticket.id, &event)
            .await
        {
            Ok(_) => true,
            Err(e) if e.is_conflict() => {
                tracing::debug!(ticket_id = ticket.doc.ticket_id, "Ticket already in goal ledger");
                false
            }
            Err(e) => return Err(e),
        };

        for period in [GoalPeriod::Diaria, GoalPeriod::Semanal] {
            self.refresh_goal(&event.vendedor_id, period, event.period_key(period))
                .await?;
        }

        if appended {
            tracing::info!(
                ticket_id = event.ticket_id,
                vendedor_id = %event.vendedor_id,
                cantidad = event.cantidad,
                dia = %event.dia,
                "Ticket recorded in goal ledger"
            );
        }
        Ok(appended)
    }

    async fn ledger_totals(
        &self,
        user_id: &str,
        period: GoalPeriod,
        clave: NaiveDate,
    ) -> Result<LedgerTotals> {
        let field = match period {
            GoalPeriod::Diaria => "dia",
            GoalPeriod::Semanal => "semana",
        };
        let events: Vec<Stored<GoalEvent>> = self
            .store
            .find_eq(
                collections::GOAL_EVENTS,
                &[
                    FieldFilter::eq("vendedorId", user_id),
                    FieldFilter::eq(field, clave.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;

        let mut totals = LedgerTotals::default();
        for event in events {
            totals.amount = totals.amount.saturating_add(event.doc.cantidad);
            totals.tickets.push(event.doc.ticket_id);
        }
        totals.tickets.sort_unstable();
        Ok(totals)
    }

    /// Recompute one goal document from the ledger, keeping its target.
    pub async fn refresh_goal(
        &self,
        user_id: &str,
        period: GoalPeriod,
        clave: NaiveDate,
    ) -> Result<Stored<Goal>> {
        self.write_goal(user_id, period, clave, |_| {}).await
    }

    /// Write the goal document with totals freshly summed from the ledger,
    /// then `apply`. Creates the document if it is missing.
    ///
    /// The ledger is re-read on every attempt: losing the compare-and-swap
    /// means another writer may have seen events this one has not.
    async fn write_goal<F>(
        &self,
        user_id: &str,
        period: GoalPeriod,
        clave: NaiveDate,
        mut apply: F,
    ) -> Result<Stored<Goal>>
    where
        F: FnMut(&mut Goal),
    {
        let key = Goal::key(user_id, period, clave);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let totals = self.ledger_totals(user_id, period, clave).await?;

            let written = match self.store.get::<Goal>(collections::GOALS, &key).await? {
                Some(mut current) => {
                    current.doc.dinero_recibido = totals.amount;
                    current.doc.tickets = totals.tickets;
                    apply(&mut current.doc);
                    current.doc.actualizado_en = Utc::now();
                    self.store.replace(collections::GOALS, &current).await
                }
                None => {
                    let mut fresh = Goal {
                        user_id: user_id.to_string(),
                        periodo: period,
                        clave,
                        dinero_recibido: totals.amount,
                        objetivo: None,
                        tickets: totals.tickets,
                        actualizado_en: Utc::now(),
                    };
                    apply(&mut fresh);
                    self.store
                        .insert_with_id(collections::GOALS, &key, &fresh)
                        .await
                }
            };

            match written {
                Err(e) if e.is_conflict() && attempt < MAX_GOAL_WRITE_ATTEMPTS => {
                    tracing::debug!(goal = %key, attempt, "Retrying contended goal write");
                }
                other => return other,
            }
        }
    }

    /// The goal for the period containing `date`. A period with no stored
    /// document reads as zero progress without a target.
    pub async fn goal_for(
        &self,
        session: &Session,
        user_id: &str,
        period: GoalPeriod,
        date: NaiveDate,
    ) -> Result<Goal> {
        require_self_or_privileged(session, user_id, "view goals")?;

        let clave = period_key(period, date);
        let key = Goal::key(user_id, period, clave);
        match self.store.get::<Goal>(collections::GOALS, &key).await? {
            Some(stored) => Ok(stored.doc),
            None => {
                let totals = self.ledger_totals(user_id, period, clave).await?;
                Ok(Goal {
                    user_id: user_id.to_string(),
                    periodo: period,
                    clave,
                    dinero_recibido: totals.amount,
                    objetivo: None,
                    tickets: totals.tickets,
                    actualizado_en: Utc::now(),
                })
            }
        }
    }

    pub async fn set_target(
        &self,
        session: &Session,
        user_id: &str,
        period: GoalPeriod,
        date: NaiveDate,
        objetivo: u64,
    ) -> Result<Stored<Goal>> {
        require_privileged(session, "set goal targets")?;
        if objetivo == 0 {
            return Err(AppError::Validation(
                "objetivo must be greater than zero".to_string(),
            ));
        }

        let clave = period_key(period, date);
        let updated = self
            .write_goal(user_id, period, clave, |goal| goal.objetivo = Some(objetivo))
            .await?;

        tracing::info!(
            user_id,
            periodo = %period,
            clave = %clave,
            objetivo,
            set_by = %session.id,
            "Goal target set"
        );
        Ok(updated)
    }

    /// Re-append ledger events for confirmed tickets missing from it.
    pub async fn rebuild_ledger(&self, session: &Session) -> Result<usize> {
        require_jefe(session, "rebuild the goal ledger")?;

        let confirmed: Vec<Stored<CashTicket>> = self
            .store
            .find_eq(
                collections::TICKETS,
                &[FieldFilter::eq("estado", TicketStatus::Confirmado.as_str())],
            )
            .await?;

        let mut added = 0;
        for ticket in &confirmed {
            if self.record_confirmed_ticket(ticket).await? {
                added += 1;
            }
        }

        tracing::info!(
            scanned = confirmed.len(),
            added,
            requested_by = %session.id,
            "Goal ledger rebuilt"
        );
        Ok(added)
    }
}
