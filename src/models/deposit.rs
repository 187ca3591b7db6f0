//! Dirty-money deposits broken down by category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

string_enum! {
    /// `pendiente -> {aprobado | rechazado}`
    DepositStatus, "deposit status" {
        Pendiente => "pendiente",
        Aprobado => "aprobado",
        Rechazado => "rechazado",
    }
}

impl DepositStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DepositStatus::Pendiente)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashDeposit {
    pub depositante_id: String,
    pub depositante_nombre: String,
    /// Category -> amount in whole dollars
    pub detalles: BTreeMap<String, u64>,
    pub total: u64,
    pub estado: DepositStatus,
    pub fecha_deposito: DateTime<Utc>,
    #[serde(default)]
    pub revisado_por_id: Option<String>,
    #[serde(default)]
    pub revisado_por_nombre: Option<String>,
    #[serde(default)]
    pub fecha_resolucion: Option<DateTime<Utc>>,
}
