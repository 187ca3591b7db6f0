//! User model and the cached session.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Clan rank. Gates every privileged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Jefe,
    Encargado,
    Empleado,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Jefe => "jefe",
            Role::Encargado => "encargado",
            Role::Empleado => "empleado",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jefe" => Ok(Role::Jefe),
            "encargado" => Ok(Role::Encargado),
            "empleado" => Ok(Role::Empleado),
            other => Err(AppError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Login name (unique)
    pub username: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// First name
    pub nombre: String,
    /// Last name
    pub apellido: String,
    pub rol: Role,
    /// Disabled users cannot log in
    #[serde(default = "default_active")]
    pub activo: bool,
    /// When the account was created
    pub creado_en: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido).trim().to_string()
    }
}

/// The acting user, as carried by the browser and by session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub username: String,
    pub nombre: String,
    pub apellido: String,
    pub rol: Role,
}

impl Session {
    /// Build a session for a stored user.
    pub fn for_user(id: &str, user: &User) -> Self {
        Self {
            id: id.to_string(),
            username: user.username.clone(),
            nombre: user.nombre.clone(),
            apellido: user.apellido.clone(),
            rol: user.rol,
        }
    }

    /// Parse a locally cached session blob.
    ///
    /// A missing or unparseable blob means the caller is not logged in.
    pub fn from_cached(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        match serde_json::from_str::<Session>(raw) {
            Ok(session) if !session.id.is_empty() => Some(session),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Discarding unparseable cached session");
                None
            }
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido).trim().to_string()
    }
}
