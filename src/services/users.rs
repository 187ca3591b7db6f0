// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User accounts and login.

use crate::db::{collections, FieldFilter, Store, Stored};
use crate::error::{AppError, Result};
use crate::models::{Role, Session, User};
use crate::services::guard::{require_jefe, require_privileged};
use crate::services::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use serde::Deserialize;
use validator::Validate;

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 64))]
    pub nombre: String,
    #[validate(length(max = 64))]
    #[serde(default)]
    pub apellido: String,
    pub rol: Role,
}

#[derive(Clone)]
pub struct UserService {
    store: Store,
}

impl UserService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Fetch a user by id.
    pub async fn get_user(&self, id: &str) -> Result<Stored<User>> {
        self.store.require(collections::USERS, id, "User").await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Stored<User>>> {
        let mut found: Vec<Stored<User>> = self
            .store
            .find_eq(collections::USERS, &[FieldFilter::eq("username", username)])
            .await?;
        Ok(found.pop())
    }

    /// Check credentials and build the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let username = username.trim().to_lowercase();
        let Some(user) = self.find_by_username(&username).await? else {
            tracing::warn!(username = %username, "Login failed: unknown user");
            return Err(AppError::Unauthorized);
        };

        let valid = verify_password(password, &user.doc.password_hash).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Stored password hash for {} is unusable: {}",
                user.id,
                e
            ))
        })?;

        if !valid || !user.doc.activo {
            tracing::warn!(user_id = %user.id, active = user.doc.activo, "Login failed");
            return Err(AppError::Unauthorized);
        }

        tracing::info!(user_id = %user.id, rol = %user.doc.rol, "User logged in");
        Ok(Session::for_user(&user.id, &user.doc))
    }

    /// Create an account (jefe only).
    pub async fn create_user(&self, session: &Session, input: NewUser) -> Result<Stored<User>> {
        require_jefe(session, "create users")?;
        let created = self.insert_user(input).await?;
        tracing::info!(
            user_id = %created.id,
            created_by = %session.id,
            rol = %created.doc.rol,
            "User created"
        );
        Ok(created)
    }

    async fn insert_user(&self, input: NewUser) -> Result<Stored<User>> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let username = input.username.trim().to_lowercase();
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(AppError::Validation(
                "username may only contain letters, digits, '.', '_' and '-'".to_string(),
            ));
        }
        if input.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.find_by_username(&username).await?.is_some() {
            return Err(AppError::Validation(format!(
                "username '{}' is already taken",
                username
            )));
        }

        let password_hash = hash_password(&input.password)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;

        let user = User {
            username,
            password_hash,
            nombre: input.nombre.trim().to_string(),
            apellido: input.apellido.trim().to_string(),
            rol: input.rol,
            activo: true,
            creado_en: chrono::Utc::now(),
        };

        self.store.insert(collections::USERS, &user).await
    }

    /// All users, sorted by username (privileged only).
    pub async fn list_users(&self, session: &Session) -> Result<Vec<Stored<User>>> {
        require_privileged(session, "list users")?;
        let mut users: Vec<Stored<User>> = self.store.list(collections::USERS).await?;
        users.sort_by(|a, b| a.doc.username.cmp(&b.doc.username));
        Ok(users)
    }

    /// Create the bootstrap `jefe` account if no user has that name yet.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<()> {
        if self
            .find_by_username(&username.trim().to_lowercase())
            .await?
            .is_some()
        {
            tracing::debug!(username, "Bootstrap admin already present");
            return Ok(());
        }

        let created = self
            .insert_user(NewUser {
                username: username.to_string(),
                password: password.to_string(),
                nombre: username.to_string(),
                apellido: String::new(),
                rol: Role::Jefe,
            })
            .await?;
        tracing::info!(user_id = %created.id, "Bootstrap admin created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use std::sync::Arc;

    fn service() -> UserService {
        UserService::new(Store::new(Arc::new(MemoryStore::new())))
    }

    fn boss() -> Session {
        Session {
            id: "boss".to_string(),
            username: "boss".to_string(),
            nombre: "Big".to_string(),
            apellido: "Boss".to_string(),
            rol: Role::Jefe,
        }
    }

    fn new_user(username: &str, rol: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "supersecret".to_string(),
            nombre: "Nico".to_string(),
            apellido: "Bellic".to_string(),
            rol,
        }
    }

    #[tokio::test]
    async fn test_create_and_login() {
        let users = service();
        let created = users
            .create_user(&boss(), new_user("Nico", Role::Empleado))
            .await
            .unwrap();
        assert_eq!(created.doc.username, "nico");

        let session = users.login("nico", "supersecret").await.unwrap();
        assert_eq!(session.id, created.id);
        assert_eq!(session.rol, Role::Empleado);

        assert!(matches!(
            users.login("nico", "wrong-password").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            users.login("ghost", "supersecret").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_only_jefe_creates_users() {
        let users = service();
        let mut manager = boss();
        manager.rol = Role::Encargado;

        let err = users
            .create_user(&manager, new_user("roman", Role::Empleado))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_duplicate_and_invalid_usernames() {
        let users = service();
        users
            .create_user(&boss(), new_user("roman", Role::Empleado))
            .await
            .unwrap();

        let dup = users
            .create_user(&boss(), new_user("ROMAN", Role::Empleado))
            .await
            .unwrap_err();
        assert!(matches!(dup, AppError::Validation(_)));

        let bad = users
            .create_user(&boss(), new_user("no spaces", Role::Empleado))
            .await
            .unwrap_err();
        assert!(matches!(bad, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let users = service();
        users.ensure_admin("admin", "changeme123").await.unwrap();
        users.ensure_admin("admin", "changeme123").await.unwrap();

        let listed = users.list_users(&boss()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].doc.rol, Role::Jefe);
    }
}
