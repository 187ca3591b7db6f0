// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Weapon issuance and the ammo/vest requests attached to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// Weapon models the clan hands out.
    WeaponType, "weapon type" {
        Pistola => "pistola",
        PistolaMk2 => "pistola_mk2",
        PistolaPesada => "pistola_pesada",
        MicroSmg => "micro_smg",
        Smg => "smg",
        Escopeta => "escopeta",
        RifleAsalto => "rifle_asalto",
    }
}

string_enum! {
    /// Why an issued weapon is gone.
    LossReason, "loss reason" {
        Muerte => "muerte",
        Arresto => "arresto",
        Robo => "robo",
        Extravio => "extravio",
    }
}

string_enum! {
    WeaponStatus, "weapon status" {
        Activa => "activa",
        Perdida => "perdida",
    }
}

string_enum! {
    /// What a weapon holder is asking for.
    RequestKind, "request kind" {
        Balas => "balas",
        Chaleco => "chaleco",
    }
}

string_enum! {
    /// `pendiente -> {entregada | rechazada}`
    RequestStatus, "request status" {
        Pendiente => "pendiente",
        Entregada => "entregada",
        Rechazada => "rechazada",
    }
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pendiente)
    }
}

/// A weapon handed by a sargento to a prospect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponIssuance {
    /// Issuer (privileged user)
    pub sargento_id: String,
    pub sargento_nombre: String,
    /// Recipient
    pub prospect_id: String,
    pub prospect_nombre: String,
    pub tipo_arma: WeaponType,
    pub estado: WeaponStatus,
    #[serde(default)]
    pub motivo_perdida: Option<LossReason>,
    pub fecha_entrega: DateTime<Utc>,
    #[serde(default)]
    pub fecha_perdida: Option<DateTime<Utc>>,
    /// Number of requests ever filed against this weapon; the next request
    /// takes this value as its index.
    #[serde(default)]
    pub solicitudes_creadas: u32,
}

/// An ammo or vest request, stored as its own document keyed by
/// `(arma_id, indice)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponRequest {
    pub arma_id: String,
    pub indice: u32,
    pub tipo: RequestKind,
    pub cantidad: u32,
    pub estado: RequestStatus,
    pub solicitante_id: String,
    pub solicitante_nombre: String,
    /// Stamped by the application at request time
    pub fecha_solicitud: DateTime<Utc>,
    #[serde(default)]
    pub resuelto_por_id: Option<String>,
    #[serde(default)]
    pub resuelto_por_nombre: Option<String>,
    #[serde(default)]
    pub fecha_resolucion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub motivo_rechazo: Option<String>,
}

impl WeaponRequest {
    /// Document key for the request at `indice` of a weapon.
    pub fn key(arma_id: &str, indice: u32) -> String {
        format!("{}_{}", arma_id, indice)
    }
}
