// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session middleware.

use crate::models::{Role, Session};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "clan_token";

/// Session lifetime in seconds.
pub const SESSION_TTL_SECS: usize = 12 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user document id)
    pub sub: String,
    pub username: String,
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    pub rol: Role,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    fn into_session(self) -> Session {
        Session {
            id: self.sub,
            username: self.username,
            nombre: self.nombre,
            apellido: self.apellido,
            rol: self.rol,
        }
    }
}

/// Middleware that requires a valid session token.
///
/// Inserts the caller's [`Session`] into request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(t) => t.to_string(),
            None => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data =
        decode::<Claims>(&token, &key, &validation).map_err(|_| StatusCode::UNAUTHORIZED)?;
    if token_data.claims.sub.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    request
        .extensions_mut()
        .insert(token_data.claims.into_session());

    Ok(next.run(request).await)
}

/// Create a JWT for a session.
pub fn create_jwt(session: &Session, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: session.id.clone(),
        username: session.username.clone(),
        nombre: session.nombre.clone(),
        apellido: session.apellido.clone(),
        rol: session.rol,
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_carries_session() {
        let session = Session {
            id: "u1".to_string(),
            username: "toni".to_string(),
            nombre: "Toni".to_string(),
            apellido: "Vega".to_string(),
            rol: Role::Encargado,
        };
        let key = b"test_jwt_key_32_bytes_minimum!!";
        let token = create_jwt(&session, key).unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(key),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(decoded.claims.exp - decoded.claims.iat, SESSION_TTL_SECS);
        assert_eq!(decoded.claims.into_session(), session);
    }
}
