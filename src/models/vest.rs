//! Standalone vest requests (not tied to a weapon).
//!
//! This flow has its own vocabulary (`aprobado`/`rechazado`) and is kept
//! apart from the weapon-linked vest requests in [`crate::models::weapon`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// `pendiente -> {aprobado | rechazado}`
    VestStatus, "vest request status" {
        Pendiente => "pendiente",
        Aprobado => "aprobado",
        Rechazado => "rechazado",
    }
}

impl VestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VestStatus::Pendiente)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestRequest {
    pub solicitante_id: String,
    pub solicitante_nombre: String,
    pub cantidad: u32,
    pub estado: VestStatus,
    pub fecha_solicitud: DateTime<Utc>,
    #[serde(default)]
    pub revisado_por_id: Option<String>,
    #[serde(default)]
    pub revisado_por_nombre: Option<String>,
    #[serde(default)]
    pub fecha_resolucion: Option<DateTime<Utc>>,
}
