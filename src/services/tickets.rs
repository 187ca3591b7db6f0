// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Cash tickets with two-phase confirmation.
//!
//! A dealer-created ticket starts `pendiente` and needs the seller to confirm
//! the amount before the dealer confirms receipt. A seller-created ticket has
//! its amount confirmed by construction and starts at `pendiente_dealer`.
//! Only the final receipt confirmation feeds the goal ledger.

use crate::db::{collections, FieldFilter, Store, Stored};
use crate::error::{AppError, Result};
use crate::models::{CashTicket, Session, TicketStatus, User};
use crate::services::goals::GoalService;
use crate::services::guard::{require_self, Capabilities};
use chrono::Utc;
use std::collections::BTreeMap;

#[derive(Clone)]
pub struct TicketService {
    store: Store,
    goals: GoalService,
}

impl TicketService {
    pub fn new(store: Store, goals: GoalService) -> Self {
        Self { store, goals }
    }

    async fn next_ticket_id(&self) -> Result<u64> {
        let tickets: Vec<Stored<CashTicket>> = self.store.list(collections::TICKETS).await?;
        Ok(tickets
            .iter()
            .map(|t| t.doc.ticket_id)
            .max()
            .unwrap_or(0)
            + 1)
    }

    pub async fn create_ticket(
        &self,
        session: &Session,
        counterpart_id: &str,
        cantidad: u64,
    ) -> Result<Stored<CashTicket>> {
        if cantidad == 0 {
            return Err(AppError::Validation(
                "cantidad must be greater than zero".to_string(),
            ));
        }
        if counterpart_id == session.id {
            return Err(AppError::Validation(
                "you cannot open a ticket with yourself".to_string(),
            ));
        }

        let counterpart: Stored<User> = self
            .store
            .require(collections::USERS, counterpart_id, "User")
            .await?;
        let now = Utc::now();
        let creator_is_dealer = Capabilities::of(session).is_privileged;

        let (dealer_id, dealer_nombre, vendedor_id, vendedor_nombre) = if creator_is_dealer {
            (
                session.id.clone(),
                session.display_name(),
                counterpart.id.clone(),
                counterpart.doc.display_name(),
            )
        } else {
            if !Capabilities::for_role(counterpart.doc.rol).is_privileged {
                return Err(AppError::Validation(
                    "tickets must be addressed to a jefe or encargado".to_string(),
                ));
            }
            (
                counterpart.id.clone(),
                counterpart.doc.display_name(),
                session.id.clone(),
                session.display_name(),
            )
        };

        let ticket_id = self.next_ticket_id().await?;
        let ticket = CashTicket {
            ticket_id,
            vendedor_id,
            vendedor_nombre,
            dealer_id,
            dealer_nombre,
            cantidad,
            estado: if creator_is_dealer {
                TicketStatus::Pendiente
            } else {
                TicketStatus::PendienteDealer
            },
            creado_por: session.id.clone(),
            fecha_creacion: now,
            fecha_confirmacion_vendedor: (!creator_is_dealer).then_some(now),
            fecha_confirmacion_dealer: None,
            motivo_rechazo: None,
        };

        let stored = self
            .store
            .insert_with_id(collections::TICKETS, &CashTicket::key(ticket_id), &ticket)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::Conflict(format!(
                    "ticket number {} was taken concurrently, please retry",
                    ticket_id
                )),
                other => other,
            })?;

        tracing::info!(
            ticket_id,
            created_by = %session.id,
            vendedor_id = %stored.doc.vendedor_id,
            dealer_id = %stored.doc.dealer_id,
            cantidad,
            estado = %stored.doc.estado,
            "Ticket created"
        );
        Ok(stored)
    }

    /// Phase one: the seller confirms the amount.
    pub async fn confirm_amount(&self, session: &Session, id: &str) -> Result<Stored<CashTicket>> {
        let updated = self
            .store
            .update(collections::TICKETS, id, "Ticket", |t: &mut CashTicket| {
                require_self(session, &t.vendedor_id, "confirm the amount of this ticket")?;
                if t.estado != TicketStatus::Pendiente {
                    return Err(AppError::InvalidState(format!(
                        "ticket {} is {}, the amount can only be confirmed while pendiente",
                        t.ticket_id, t.estado
                    )));
                }
                t.estado = TicketStatus::PendienteDealer;
                t.fecha_confirmacion_vendedor = Some(Utc::now());
                Ok(())
            })
            .await?;

        tracing::info!(ticket_id = updated.doc.ticket_id, vendedor_id = %session.id, "Ticket amount confirmed");
        Ok(updated)
    }

    /// Phase two: the dealer confirms receipt. The ticket then counts
    /// towards the seller's goals.
    pub async fn confirm_receipt(&self, session: &Session, id: &str) -> Result<Stored<CashTicket>> {
        let updated = self
            .store
            .update(collections::TICKETS, id, "Ticket", |t: &mut CashTicket| {
                require_self(session, &t.dealer_id, "confirm receipt of this ticket")?;
                if t.estado != TicketStatus::PendienteDealer {
                    return Err(AppError::InvalidState(format!(
                        "ticket {} is {}, receipt can only be confirmed while pendiente_dealer",
                        t.ticket_id, t.estado
                    )));
                }
                t.estado = TicketStatus::Confirmado;
                t.fecha_confirmacion_dealer = Some(Utc::now());
                Ok(())
            })
            .await?;

        tracing::info!(ticket_id = updated.doc.ticket_id, dealer_id = %session.id, "Ticket receipt confirmed");

        // The ticket is the record of truth; a failed ledger write is
        // repaired by rebuild_ledger.
        if let Err(e) = self.goals.record_confirmed_ticket(&updated).await {
            tracing::error!(
                ticket_id = updated.doc.ticket_id,
                error = %e,
                "Failed to record confirmed ticket in goal ledger"
            );
        }
        Ok(updated)
    }

    /// Reject a ticket. The seller may reject while `pendiente`, the dealer
    /// while `pendiente_dealer`. Goals are never touched.
    pub async fn reject_ticket(
        &self,
        session: &Session,
        id: &str,
        motivo: Option<String>,
    ) -> Result<Stored<CashTicket>> {
        let updated = self
            .store
            .update(collections::TICKETS, id, "Ticket", |t: &mut CashTicket| {
                if session.id != t.vendedor_id && session.id != t.dealer_id {
                    return Err(AppError::Forbidden(
                        "only the seller or dealer of this ticket can reject it".to_string(),
                    ));
                }
                let rejecter = match t.estado {
                    TicketStatus::Pendiente => &t.vendedor_id,
                    TicketStatus::PendienteDealer => &t.dealer_id,
                    terminal => {
                        return Err(AppError::InvalidState(format!(
                            "ticket {} is already {}",
                            t.ticket_id, terminal
                        )))
                    }
                };
                if *rejecter != session.id {
                    return Err(AppError::Forbidden(format!(
                        "a ticket in state {} can only be rejected by the {}",
                        t.estado,
                        if t.estado == TicketStatus::Pendiente {
                            "seller"
                        } else {
                            "dealer"
                        }
                    )));
                }
                t.estado = TicketStatus::Rechazado;
                t.motivo_rechazo = motivo.clone();
                Ok(())
            })
            .await?;

        tracing::info!(ticket_id = updated.doc.ticket_id, rejected_by = %session.id, "Ticket rejected");
        Ok(updated)
    }

    /// Privileged users see every ticket; others see tickets where they are
    /// the seller or the dealer. Highest number first.
    pub async fn list_tickets(&self, session: &Session) -> Result<Vec<Stored<CashTicket>>> {
        let mut tickets: Vec<Stored<CashTicket>> = if Capabilities::of(session).is_privileged {
            self.store.list(collections::TICKETS).await?
        } else {
            let mut by_id = BTreeMap::new();
            for field in ["vendedorId", "dealerId"] {
                let found: Vec<Stored<CashTicket>> = self
                    .store
                    .find_eq(
                        collections::TICKETS,
                        &[FieldFilter::eq(field, session.id.as_str())],
                    )
                    .await?;
                for t in found {
                    by_id.insert(t.id.clone(), t);
                }
            }
            by_id.into_values().collect()
        };
        tickets.sort_by(|a, b| b.doc.ticket_id.cmp(&a.doc.ticket_id));
        Ok(tickets)
    }
}
