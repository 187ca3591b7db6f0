// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public proxy routes for the calling agent and the chat widget.
//!
//! These endpoints are reachable without a session; the webhook is
//! authenticated by its body signature instead.

use crate::error::{AppError, Result};
use crate::services::chat::{ChatMessage, ChatReply};
use crate::services::retell::SIGNATURE_HEADER;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Call events relayed to the chat workflow.
const FORWARDED_EVENTS: &[&str] = &["call_ended", "call_analyzed"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/retell/create-call", post(create_call))
        .route("/api/retell/webhook", post(retell_webhook))
        .route("/api/chat/send", post(chat_send))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallBody {
    to_number: String,
    #[serde(default)]
    nombre: Option<String>,
    #[serde(default)]
    variables: BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallResponse {
    call_id: String,
    status: Option<String>,
}

#[derive(Serialize)]
pub struct WebhookAck {
    received: bool,
}

/// E.164: `+` followed by 8 to 15 digits.
fn is_phone_number(raw: &str) -> bool {
    raw.strip_prefix('+').is_some_and(|digits| {
        (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
    })
}

async fn create_call(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCallBody>,
) -> Result<Json<CreateCallResponse>> {
    let to_number = body.to_number.trim();
    if !is_phone_number(to_number) {
        return Err(AppError::Validation(
            "toNumber must be an E.164 phone number like +34600111222".to_string(),
        ));
    }

    let mut variables = body.variables;
    if let Some(nombre) = body.nombre.filter(|n| !n.trim().is_empty()) {
        variables.insert("nombre".to_string(), nombre.trim().to_string());
    }

    let created = state.retell.create_call(to_number, variables).await?;
    Ok(Json(CreateCallResponse {
        call_id: created.call_id,
        status: created.call_status,
    }))
}

async fn retell_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<WebhookAck>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if !state.retell.verify_signature(&body, signature)? {
        tracing::warn!("Security Alert: Retell webhook signature mismatch");
        return Err(AppError::Unauthorized);
    }

    let event: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;
    let kind = event
        .get("event")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    tracing::info!(event = kind, "Retell webhook received");
    if FORWARDED_EVENTS.contains(&kind) {
        state.chat.forward_event(&event).await;
    }

    Ok((StatusCode::OK, Json(WebhookAck { received: true })))
}

async fn chat_send(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatMessage>,
) -> Result<Json<ChatReply>> {
    Ok(Json(state.chat.send(&body).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_phone_number() {
        assert!(is_phone_number("+34600111222"));
        assert!(!is_phone_number("34600111222"));
        assert!(!is_phone_number("+34 600 111 222"));
        assert!(!is_phone_number("+123"));
    }
}
