// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role guard.
//!
//! Every mutating operation re-checks capability and ownership here before
//! touching the store. Failed checks are errors, never silent no-ops.

use crate::error::{AppError, Result};
use crate::models::{Role, Session};

/// What a role is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Issues equipment, approves requests (sargento/dealer)
    pub is_privileged: bool,
    /// Receives equipment, files requests (prospect/vendedor)
    pub is_requester: bool,
}

impl Capabilities {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Jefe | Role::Encargado => Self {
                is_privileged: true,
                is_requester: false,
            },
            Role::Empleado => Self {
                is_privileged: false,
                is_requester: true,
            },
        }
    }

    pub fn of(session: &Session) -> Self {
        Self::for_role(session.rol)
    }
}

pub fn require_privileged(session: &Session, action: &str) -> Result<()> {
    if Capabilities::of(session).is_privileged {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "only jefe or encargado can {}",
            action
        )))
    }
}

pub fn require_jefe(session: &Session, action: &str) -> Result<()> {
    if session.rol == Role::Jefe {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("only jefe can {}", action)))
    }
}

/// The acting user must be the named counterpart.
pub fn require_self(session: &Session, owner_id: &str, action: &str) -> Result<()> {
    if session.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "only the assigned user can {}",
            action
        )))
    }
}

/// Owner, or any privileged user.
pub fn require_self_or_privileged(session: &Session, owner_id: &str, action: &str) -> Result<()> {
    if session.id == owner_id || Capabilities::of(session).is_privileged {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "you can only {} for yourself",
            action
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, rol: Role) -> Session {
        Session {
            id: id.to_string(),
            username: id.to_string(),
            nombre: "N".to_string(),
            apellido: "A".to_string(),
            rol,
        }
    }

    #[test]
    fn test_capabilities_by_role() {
        assert!(Capabilities::for_role(Role::Jefe).is_privileged);
        assert!(Capabilities::for_role(Role::Encargado).is_privileged);
        assert!(!Capabilities::for_role(Role::Empleado).is_privileged);
        assert!(Capabilities::for_role(Role::Empleado).is_requester);
        assert!(!Capabilities::for_role(Role::Jefe).is_requester);
    }

    #[test]
    fn test_guards() {
        let boss = session("b", Role::Jefe);
        let manager = session("m", Role::Encargado);
        let worker = session("w", Role::Empleado);

        assert!(require_privileged(&manager, "approve").is_ok());
        assert!(matches!(
            require_privileged(&worker, "approve"),
            Err(AppError::Forbidden(_))
        ));
        assert!(require_jefe(&boss, "create users").is_ok());
        assert!(require_jefe(&manager, "create users").is_err());
        assert!(require_self(&worker, "w", "confirm").is_ok());
        assert!(require_self(&manager, "w", "confirm").is_err());
        assert!(require_self_or_privileged(&manager, "w", "view").is_ok());
        assert!(require_self_or_privileged(&worker, "x", "view").is_err());
    }
}
