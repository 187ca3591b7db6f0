//! Standalone vest requests.

use crate::db::{collections, FieldFilter, Store, Stored};
use crate::error::{AppError, Result};
use crate::models::{Session, VestRequest, VestStatus};
use crate::services::guard::{require_privileged, Capabilities};
use chrono::Utc;

#[derive(Clone)]
pub struct VestService {
    store: Store,
}

impl VestService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn request_vests(&self, session: &Session, cantidad: u32) -> Result<Stored<VestRequest>> {
        if cantidad == 0 {
            return Err(AppError::Validation(
                "cantidad must be greater than zero".to_string(),
            ));
        }

        let request = VestRequest {
            solicitante_id: session.id.clone(),
            solicitante_nombre: session.display_name(),
            cantidad,
            estado: VestStatus::Pendiente,
            fecha_solicitud: Utc::now(),
            revisado_por_id: None,
            revisado_por_nombre: None,
            fecha_resolucion: None,
        };

        let stored = self.store.insert(collections::VEST_REQUESTS, &request).await?;
        tracing::info!(request_id = %stored.id, user_id = %session.id, cantidad, "Vest request filed");
        Ok(stored)
    }

    pub async fn approve(&self, session: &Session, id: &str) -> Result<Stored<VestRequest>> {
        self.resolve(session, id, VestStatus::Aprobado).await
    }

    pub async fn reject(&self, session: &Session, id: &str) -> Result<Stored<VestRequest>> {
        self.resolve(session, id, VestStatus::Rechazado).await
    }

    async fn resolve(
        &self,
        session: &Session,
        id: &str,
        outcome: VestStatus,
    ) -> Result<Stored<VestRequest>> {
        require_privileged(session, "resolve vest requests")?;

        let updated = self
            .store
            .update(collections::VEST_REQUESTS, id, "Vest request", |r: &mut VestRequest| {
                if r.estado.is_terminal() {
                    return Err(AppError::InvalidState(format!(
                        "vest request {} is already {}",
                        id, r.estado
                    )));
                }
                r.estado = outcome;
                r.revisado_por_id = Some(session.id.clone());
                r.revisado_por_nombre = Some(session.display_name());
                r.fecha_resolucion = Some(Utc::now());
                Ok(())
            })
            .await?;

        tracing::info!(request_id = id, resolved_by = %session.id, estado = %outcome, "Vest request resolved");
        Ok(updated)
    }

    /// Privileged users see every request, others only their own. Newest first.
    pub async fn list(&self, session: &Session) -> Result<Vec<Stored<VestRequest>>> {
        let mut requests: Vec<Stored<VestRequest>> = if Capabilities::of(session).is_privileged {
            self.store.list(collections::VEST_REQUESTS).await?
        } else {
            self.store
                .find_eq(
                    collections::VEST_REQUESTS,
                    &[FieldFilter::eq("solicitanteId", session.id.as_str())],
                )
                .await?
        };
        requests.sort_by(|a, b| b.doc.fecha_solicitud.cmp(&a.doc.fecha_solicitud));
        Ok(requests)
    }
}
