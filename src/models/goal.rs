// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Sales goals and the ledger of confirmed tickets they are computed from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    GoalPeriod, "goal period" {
        Diaria => "diaria",
        Semanal => "semanal",
    }
}

/// One confirmed ticket, appended once and never modified.
///
/// Stored at: `metas_eventos/{ticket document id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalEvent {
    pub ticket_id: u64,
    pub vendedor_id: String,
    pub cantidad: u64,
    pub confirmado_en: DateTime<Utc>,
    /// Civil date of confirmation
    pub dia: NaiveDate,
    /// Civil Monday of the confirmation week
    pub semana: NaiveDate,
}

impl GoalEvent {
    /// The period key this event falls into.
    pub fn period_key(&self, period: GoalPeriod) -> NaiveDate {
        match period {
            GoalPeriod::Diaria => self.dia,
            GoalPeriod::Semanal => self.semana,
        }
    }
}

/// Money received by a seller in one period, recomputed from the ledger.
///
/// Stored at: `metas/{user_id}_{periodo}_{clave}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub user_id: String,
    pub periodo: GoalPeriod,
    /// Civil date (daily) or civil Monday (weekly)
    pub clave: NaiveDate,
    pub dinero_recibido: u64,
    /// Target amount, set by a privileged user
    #[serde(default)]
    pub objetivo: Option<u64>,
    /// Ticket numbers included in `dinero_recibido`
    #[serde(default)]
    pub tickets: Vec<u64>,
    pub actualizado_en: DateTime<Utc>,
}

impl Goal {
    pub fn key(user_id: &str, period: GoalPeriod, clave: NaiveDate) -> String {
        format!("{}_{}_{}", user_id, period, clave.format("%Y-%m-%d"))
    }

    /// Fraction of the target reached, if a target is set.
    pub fn progress(&self) -> Option<f64> {
        match self.objetivo {
            Some(0) | None => None,
            Some(target) => Some(self.dinero_recibido as f64 / target as f64),
        }
    }
}
