//! User administration routes.

use crate::error::Result;
use crate::models::{Role, Session, User};
use crate::services::users::NewUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users", get(list_users).post(create_user))
}

/// A user without credentials.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub nombre: String,
    pub apellido: String,
    pub rol: Role,
    pub activo: bool,
}

impl UserView {
    fn new(id: String, user: User) -> Self {
        Self {
            id,
            username: user.username,
            nombre: user.nombre,
            apellido: user.apellido,
            rol: user.rol,
            activo: user.activo,
        }
    }
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<UserView>>> {
    let users = state.users.list_users(&session).await?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| UserView::new(u.id, u.doc))
            .collect(),
    ))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<UserView>)> {
    let created = state.users.create_user(&session, body).await?;
    Ok((StatusCode::CREATED, Json(UserView::new(created.id, created.doc))))
}
