// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weapon issuance and the ammo/vest request workflow.
//!
//! Flow:
//! 1. A sargento issues a weapon to a prospect (`activa`)
//! 2. The prospect files ammo or vest requests against it (`pendiente`)
//! 3. Any privileged user delivers or rejects each request
//! 4. The issuing sargento may mark the weapon lost (`perdida`), after which
//!    no new requests are accepted
//!
//! Each request is its own document keyed by `(weapon, index)`, so resolving
//! two requests of the same weapon never contend. Appending a request bumps a
//! counter on the weapon with compare-and-swap, which also serializes it
//! against a concurrent loss.

use crate::db::{collections, FieldFilter, Store, Stored};
use crate::error::{AppError, Result};
use crate::models::{
    LossReason, RequestKind, RequestStatus, Session, User, WeaponIssuance, WeaponRequest,
    WeaponStatus, WeaponType,
};
use crate::services::guard::{require_privileged, require_self_or_privileged, Capabilities};
use chrono::Utc;

#[derive(Clone)]
pub struct WeaponService {
    store: Store,
}

impl WeaponService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    // ─── Issuance ────────────────────────────────────────────────

    /// Issue a weapon to a prospect.
    pub async fn issue_weapon(
        &self,
        session: &Session,
        prospect_id: &str,
        tipo_arma: WeaponType,
    ) -> Result<Stored<WeaponIssuance>> {
        require_privileged(session, "issue weapons")?;

        if prospect_id == session.id {
            return Err(AppError::Validation(
                "you cannot issue a weapon to yourself".to_string(),
            ));
        }

        let prospect: Stored<User> = self
            .store
            .require(collections::USERS, prospect_id, "User")
            .await?;

        let weapon = WeaponIssuance {
            sargento_id: session.id.clone(),
            sargento_nombre: session.display_name(),
            prospect_id: prospect.id.clone(),
            prospect_nombre: prospect.doc.display_name(),
            tipo_arma,
            estado: WeaponStatus::Activa,
            motivo_perdida: None,
            fecha_entrega: Utc::now(),
            fecha_perdida: None,
            solicitudes_creadas: 0,
        };

        let stored = self.store.insert(collections::WEAPONS, &weapon).await?;
        tracing::info!(
            weapon_id = %stored.id,
            sargento_id = %session.id,
            prospect_id = %prospect.id,
            tipo = %tipo_arma,
            "Weapon issued"
        );
        Ok(stored)
    }

    /// Mark a weapon as lost. Only the sargento who issued it may do this.
    pub async fn mark_lost(
        &self,
        session: &Session,
        weapon_id: &str,
        reason: LossReason,
    ) -> Result<Stored<WeaponIssuance>> {
        let updated = self
            .store
            .update(collections::WEAPONS, weapon_id, "Weapon", |w: &mut WeaponIssuance| {
                if w.sargento_id != session.id {
                    return Err(AppError::Forbidden(
                        "only the sargento who issued this weapon can mark it lost".to_string(),
                    ));
                }
                if w.estado == WeaponStatus::Perdida {
                    return Err(AppError::InvalidState(format!(
                        "weapon {} is already marked lost",
                        weapon_id
                    )));
                }
                w.estado = WeaponStatus::Perdida;
                w.motivo_perdida = Some(reason);
                w.fecha_perdida = Some(Utc::now());
                Ok(())
            })
            .await?;

        tracing::info!(
            weapon_id,
            sargento_id = %session.id,
            reason = %reason,
            "Weapon marked lost"
        );
        Ok(updated)
    }

    /// Weapons visible to the caller, newest first.
    pub async fn list_weapons(&self, session: &Session) -> Result<Vec<Stored<WeaponIssuance>>> {
        let mut weapons: Vec<Stored<WeaponIssuance>> = if Capabilities::of(session).is_privileged
        {
            self.store.list(collections::WEAPONS).await?
        } else {
            self.store
                .find_eq(
                    collections::WEAPONS,
                    &[FieldFilter::eq("prospectId", session.id.as_str())],
                )
                .await?
        };
        weapons.sort_by(|a, b| b.doc.fecha_entrega.cmp(&a.doc.fecha_entrega));
        Ok(weapons)
    }

    // ─── Requests ────────────────────────────────────────────────

    pub async fn request_ammo(
        &self,
        session: &Session,
        weapon_id: &str,
        cantidad: u32,
    ) -> Result<Stored<WeaponRequest>> {
        self.file_request(session, weapon_id, RequestKind::Balas, cantidad)
            .await
    }

    pub async fn request_vest(
        &self,
        session: &Session,
        weapon_id: &str,
        cantidad: u32,
    ) -> Result<Stored<WeaponRequest>> {
        self.file_request(session, weapon_id, RequestKind::Chaleco, cantidad)
            .await
    }

    async fn file_request(
        &self,
        session: &Session,
        weapon_id: &str,
        tipo: RequestKind,
        cantidad: u32,
    ) -> Result<Stored<WeaponRequest>> {
        // State before identity: a lost weapon refuses everyone.
        let weapon = self
            .store
            .update(collections::WEAPONS, weapon_id, "Weapon", |w: &mut WeaponIssuance| {
                if w.estado == WeaponStatus::Perdida {
                    return Err(AppError::InvalidState(format!(
                        "weapon {} is marked lost; no more {} can be requested",
                        weapon_id, tipo
                    )));
                }
                if w.prospect_id != session.id {
                    return Err(AppError::Forbidden(
                        "only the holder of this weapon can file requests for it".to_string(),
                    ));
                }
                if cantidad == 0 {
                    return Err(AppError::Validation(
                        "cantidad must be greater than zero".to_string(),
                    ));
                }
                w.solicitudes_creadas += 1;
                Ok(())
            })
            .await?;

        let indice = weapon.doc.solicitudes_creadas - 1;
        let request = WeaponRequest {
            arma_id: weapon.id.clone(),
            indice,
            tipo,
            cantidad,
            estado: RequestStatus::Pendiente,
            solicitante_id: session.id.clone(),
            solicitante_nombre: session.display_name(),
            fecha_solicitud: Utc::now(),
            resuelto_por_id: None,
            resuelto_por_nombre: None,
            fecha_resolucion: None,
            motivo_rechazo: None,
        };

        let stored = self
            .store
            .insert_with_id(
                collections::WEAPON_REQUESTS,
                &WeaponRequest::key(&weapon.id, indice),
                &request,
            )
            .await?;

        tracing::info!(
            request_id = %stored.id,
            weapon_id,
            tipo = %tipo,
            cantidad,
            "Weapon request filed"
        );
        Ok(stored)
    }

    /// Deliver a pending request. Any privileged user may resolve requests,
    /// not only the issuing sargento.
    pub async fn deliver_request(
        &self,
        session: &Session,
        request_id: &str,
    ) -> Result<Stored<WeaponRequest>> {
        self.resolve_request(session, request_id, RequestStatus::Entregada, None)
            .await
    }

    pub async fn reject_request(
        &self,
        session: &Session,
        request_id: &str,
        motivo: Option<String>,
    ) -> Result<Stored<WeaponRequest>> {
        self.resolve_request(session, request_id, RequestStatus::Rechazada, motivo)
            .await
    }

    async fn resolve_request(
        &self,
        session: &Session,
        request_id: &str,
        outcome: RequestStatus,
        motivo: Option<String>,
    ) -> Result<Stored<WeaponRequest>> {
        require_privileged(session, "resolve weapon requests")?;

        let updated = self
            .store
            .update(
                collections::WEAPON_REQUESTS,
                request_id,
                "Request",
                |r: &mut WeaponRequest| {
                    if r.estado.is_terminal() {
                        return Err(AppError::InvalidState(format!(
                            "request {} is already {}",
                            request_id, r.estado
                        )));
                    }
                    r.estado = outcome;
                    r.resuelto_por_id = Some(session.id.clone());
                    r.resuelto_por_nombre = Some(session.display_name());
                    r.fecha_resolucion = Some(Utc::now());
                    r.motivo_rechazo = motivo.clone();
                    Ok(())
                },
            )
            .await?;

        tracing::info!(
            request_id,
            resolved_by = %session.id,
            estado = %outcome,
            "Weapon request resolved"
        );
        Ok(updated)
    }

    /// Requests filed against a weapon, in filing order.
    pub async fn list_requests(
        &self,
        session: &Session,
        weapon_id: &str,
    ) -> Result<Vec<Stored<WeaponRequest>>> {
        let weapon: Stored<WeaponIssuance> = self
            .store
            .require(collections::WEAPONS, weapon_id, "Weapon")
            .await?;
        require_self_or_privileged(session, &weapon.doc.prospect_id, "view weapon requests")?;

        let mut requests: Vec<Stored<WeaponRequest>> = self
            .store
            .find_eq(
                collections::WEAPON_REQUESTS,
                &[FieldFilter::eq("armaId", weapon_id)],
            )
            .await?;
        requests.sort_by_key(|r| r.doc.indice);
        Ok(requests)
    }
}
