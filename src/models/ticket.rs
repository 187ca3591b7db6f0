// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Cash tickets: money handed from a seller to a dealer, confirmed in two phases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// `pendiente -> pendiente_dealer -> {confirmado | rechazado}`;
    /// rejection is also possible straight from `pendiente`.
    TicketStatus, "ticket status" {
        Pendiente => "pendiente",
        PendienteDealer => "pendiente_dealer",
        Confirmado => "confirmado",
        Rechazado => "rechazado",
    }
}

impl TicketStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Confirmado | TicketStatus::Rechazado)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashTicket {
    /// Sequential, human-facing number
    pub ticket_id: u64,
    /// Seller handing over the money (goal owner)
    pub vendedor_id: String,
    pub vendedor_nombre: String,
    /// Sargento receiving the money
    pub dealer_id: String,
    pub dealer_nombre: String,
    /// Amount in whole dollars
    pub cantidad: u64,
    pub estado: TicketStatus,
    /// Who opened the ticket
    pub creado_por: String,
    pub fecha_creacion: DateTime<Utc>,
    #[serde(default)]
    pub fecha_confirmacion_vendedor: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fecha_confirmacion_dealer: Option<DateTime<Utc>>,
    #[serde(default)]
    pub motivo_rechazo: Option<String>,
}

impl CashTicket {
    /// Document key for a ticket number.
    pub fn key(ticket_id: u64) -> String {
        format!("ticket-{:06}", ticket_id)
    }
}
