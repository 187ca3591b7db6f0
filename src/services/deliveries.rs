// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Product deliveries from dealers to sellers.
//!
//! The dealer records what was handed over; the named seller confirms or
//! rejects it. A pending delivery can be withdrawn by the dealer who created
//! it, which is the only physical deletion in the system.

use crate::db::{collections, FieldFilter, Store, Stored};
use crate::error::{AppError, Result};
use crate::models::{non_blank, DeliveryStatus, ProductDelivery, ProductLine, Session, User};
use crate::services::guard::{require_privileged, require_self, Capabilities};
use chrono::Utc;

#[derive(Clone)]
pub struct DeliveryService {
    store: Store,
}

impl DeliveryService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create_delivery(
        &self,
        session: &Session,
        vendedor_id: &str,
        productos: Vec<ProductLine>,
    ) -> Result<Stored<ProductDelivery>> {
        require_privileged(session, "record deliveries")?;

        if vendedor_id == session.id {
            return Err(AppError::Validation(
                "you cannot deliver products to yourself".to_string(),
            ));
        }
        let productos = validate_products(productos)?;

        let vendedor: Stored<User> = self
            .store
            .require(collections::USERS, vendedor_id, "User")
            .await?;

        let delivery = ProductDelivery {
            dealer_id: session.id.clone(),
            dealer_nombre: session.display_name(),
            vendedor_id: vendedor.id.clone(),
            vendedor_nombre: vendedor.doc.display_name(),
            productos,
            estado: DeliveryStatus::Pendiente,
            fecha_entrega: Utc::now(),
            fecha_resolucion: None,
        };

        let stored = self.store.insert(collections::DELIVERIES, &delivery).await?;
        tracing::info!(
            delivery_id = %stored.id,
            dealer_id = %session.id,
            vendedor_id,
            units = stored.doc.total_units(),
            "Delivery recorded"
        );
        Ok(stored)
    }

    pub async fn confirm_delivery(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<Stored<ProductDelivery>> {
        self.resolve(session, id, DeliveryStatus::Confirmado).await
    }

    pub async fn reject_delivery(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<Stored<ProductDelivery>> {
        self.resolve(session, id, DeliveryStatus::Rechazado).await
    }

    async fn resolve(
        &self,
        session: &Session,
        id: &str,
        outcome: DeliveryStatus,
    ) -> Result<Stored<ProductDelivery>> {
        let updated = self
            .store
            .update(collections::DELIVERIES, id, "Delivery", |d: &mut ProductDelivery| {
                require_self(session, &d.vendedor_id, "confirm or reject this delivery")?;
                if d.estado.is_terminal() {
                    return Err(AppError::InvalidState(format!(
                        "delivery {} is already {}",
                        id, d.estado
                    )));
                }
                d.estado = outcome;
                d.fecha_resolucion = Some(Utc::now());
                Ok(())
            })
            .await?;

        tracing::info!(delivery_id = id, vendedor_id = %session.id, estado = %outcome, "Delivery resolved");
        Ok(updated)
    }

    /// Withdraw a pending delivery (creator only).
    pub async fn delete_delivery(&self, session: &Session, id: &str) -> Result<()> {
        let delivery: Stored<ProductDelivery> = self
            .store
            .require(collections::DELIVERIES, id, "Delivery")
            .await?;

        require_self(session, &delivery.doc.dealer_id, "delete this delivery")?;
        if delivery.doc.estado != DeliveryStatus::Pendiente {
            return Err(AppError::InvalidState(format!(
                "delivery {} is already {} and can no longer be deleted",
                id, delivery.doc.estado
            )));
        }

        // Loses against a confirm or reject that lands after the read above
        self.store
            .delete_unchanged(collections::DELIVERIES, &delivery)
            .await?;
        tracing::info!(delivery_id = id, dealer_id = %session.id, "Pending delivery deleted");
        Ok(())
    }

    /// Privileged users see all deliveries, sellers the ones addressed to them.
    pub async fn list_deliveries(&self, session: &Session) -> Result<Vec<Stored<ProductDelivery>>> {
        let mut deliveries: Vec<Stored<ProductDelivery>> =
            if Capabilities::of(session).is_privileged {
                self.store.list(collections::DELIVERIES).await?
            } else {
                self.store
                    .find_eq(
                        collections::DELIVERIES,
                        &[FieldFilter::eq("vendedorId", session.id.as_str())],
                    )
                    .await?
            };
        deliveries.sort_by(|a, b| b.doc.fecha_entrega.cmp(&a.doc.fecha_entrega));
        Ok(deliveries)
    }
}

fn validate_products(productos: Vec<ProductLine>) -> Result<Vec<ProductLine>> {
    if productos.is_empty() {
        return Err(AppError::Validation(
            "a delivery needs at least one product".to_string(),
        ));
    }
    productos
        .into_iter()
        .map(|p| {
            let nombre = non_blank(&p.nombre, "product name")?;
            if p.cantidad == 0 {
                return Err(AppError::Validation(format!(
                    "cantidad for '{}' must be greater than zero",
                    nombre
                )));
            }
            Ok(ProductLine {
                nombre,
                cantidad: p.cantidad,
            })
        })
        .collect()
}
