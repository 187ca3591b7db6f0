//! Product deliveries from a dealer to a seller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// `pendiente -> {confirmado | rechazado}`
    DeliveryStatus, "delivery status" {
        Pendiente => "pendiente",
        Confirmado => "confirmado",
        Rechazado => "rechazado",
    }
}

impl DeliveryStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliveryStatus::Pendiente)
    }
}

/// One product and how many units were handed over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLine {
    pub nombre: String,
    pub cantidad: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDelivery {
    pub dealer_id: String,
    pub dealer_nombre: String,
    pub vendedor_id: String,
    pub vendedor_nombre: String,
    pub productos: Vec<ProductLine>,
    pub estado: DeliveryStatus,
    pub fecha_entrega: DateTime<Utc>,
    #[serde(default)]
    pub fecha_resolucion: Option<DateTime<Utc>>,
}

impl ProductDelivery {
    /// Total units across all product lines.
    pub fn total_units(&self) -> u64 {
        self.productos.iter().map(|p| u64::from(p.cantidad)).sum()
    }
}
