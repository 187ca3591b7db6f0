//! Tuning quotes and the register of performed jobs.

use crate::db::{collections, FieldFilter, Store, Stored};
use crate::error::Result;
use crate::models::{non_blank, Session, TuningJob};
use crate::services::guard::Capabilities;
use crate::services::pricing::{
    calculate_price, DiscountKind, PriceBreakdown, ServiceSelection, VehicleCategory,
};
use chrono::Utc;
use serde::Deserialize;

/// A job as submitted by the mechanic. Any client-side price is ignored.
///
/// Category and discount kind arrive as plain strings so unknown values are
/// reported as validation errors.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningOrder {
    #[serde(default)]
    pub cliente: String,
    pub categoria: String,
    #[serde(default)]
    pub servicios: ServiceSelection,
    #[serde(default)]
    pub piezas_esteticas: u32,
    #[serde(default)]
    pub descuento_tipo: Option<String>,
    #[serde(default)]
    pub descuento_porcentaje: Option<u32>,
}

impl TuningOrder {
    fn category(&self) -> Result<VehicleCategory> {
        self.categoria.trim().parse()
    }

    fn discount_kind(&self) -> Result<Option<DiscountKind>> {
        self.descuento_tipo
            .as_deref()
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(|kind| kind.parse::<DiscountKind>())
            .transpose()
    }

    pub fn quote(&self) -> Result<PriceBreakdown> {
        calculate_price(
            self.category()?,
            &self.servicios,
            self.piezas_esteticas,
            self.discount_kind()?,
            self.descuento_porcentaje,
        )
    }
}

#[derive(Clone)]
pub struct TuningService {
    store: Store,
}

impl TuningService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn register_tuning(
        &self,
        session: &Session,
        order: TuningOrder,
    ) -> Result<Stored<TuningJob>> {
        let precio = order.quote()?;
        let categoria = order.category()?;
        let descuento_tipo = order.discount_kind()?;
        let cliente = non_blank(&order.cliente, "cliente")?;

        let job = TuningJob {
            mecanico_id: session.id.clone(),
            mecanico_nombre: session.display_name(),
            cliente,
            categoria,
            servicios: order.servicios,
            piezas_esteticas: order.piezas_esteticas,
            descuento_tipo,
            descuento_porcentaje: descuento_tipo.and(order.descuento_porcentaje),
            precio,
            fecha: Utc::now(),
        };

        let stored = self.store.insert(collections::TUNINGS, &job).await?;
        tracing::info!(
            tuning_id = %stored.id,
            mecanico_id = %session.id,
            categoria = %job.categoria,
            total = precio.total,
            "Tuning registered"
        );
        Ok(stored)
    }

    pub async fn list_tunings(&self, session: &Session) -> Result<Vec<Stored<TuningJob>>> {
        let mut jobs: Vec<Stored<TuningJob>> = if Capabilities::of(session).is_privileged {
            self.store.list(collections::TUNINGS).await?
        } else {
            self.store
                .find_eq(
                    collections::TUNINGS,
                    &[FieldFilter::eq("mecanicoId", session.id.as_str())],
                )
                .await?
        };
        jobs.sort_by(|a, b| b.doc.fecha.cmp(&a.doc.fecha));
        Ok(jobs)
    }
}
