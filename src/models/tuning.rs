//! Performed vehicle tuning jobs.

use crate::services::pricing::{DiscountKind, PriceBreakdown, ServiceSelection, VehicleCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningJob {
    pub mecanico_id: String,
    pub mecanico_nombre: String,
    /// Customer name or plate, free text
    pub cliente: String,
    pub categoria: VehicleCategory,
    pub servicios: ServiceSelection,
    pub piezas_esteticas: u32,
    #[serde(default)]
    pub descuento_tipo: Option<DiscountKind>,
    #[serde(default)]
    pub descuento_porcentaje: Option<u32>,
    /// Recomputed server-side when the job is registered
    pub precio: PriceBreakdown,
    pub fecha: DateTime<Utc>,
}
