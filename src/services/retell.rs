// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Retell voice-agent API client.
//!
//! Handles:
//! - Outbound phone call creation with the configured agent
//! - Webhook signature verification (`x-retell-signature`)

use crate::config::RetellConfig;
use crate::error::AppError;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook body signature.
pub const SIGNATURE_HEADER: &str = "x-retell-signature";

#[derive(Clone)]
pub struct RetellClient {
    http: reqwest::Client,
    config: Option<RetellConfig>,
}

#[derive(Debug, Serialize)]
struct CreatePhoneCall<'a> {
    from_number: &'a str,
    to_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    override_agent_id: Option<&'a str>,
    retell_llm_dynamic_variables: BTreeMap<String, String>,
}

/// Subset of the create-call response we relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallCreated {
    pub call_id: String,
    #[serde(default)]
    pub call_status: Option<String>,
}

impl RetellClient {
    pub fn new(config: Option<RetellConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn config(&self) -> Result<&RetellConfig, AppError> {
        self.config
            .as_ref()
            .ok_or(AppError::NotConfigured("RETELL_API_KEY"))
    }

    /// Start an outbound call to `to_number`.
    pub async fn create_call(
        &self,
        to_number: &str,
        variables: BTreeMap<String, String>,
    ) -> Result<CallCreated, AppError> {
        let config = self.config()?;
        let from_number = config
            .from_number
            .as_deref()
            .ok_or(AppError::NotConfigured("RETELL_FROM_NUMBER"))?;

        let url = format!("{}/v2/create-phone-call", config.api_url.trim_end_matches('/'));
        let body = CreatePhoneCall {
            from_number,
            to_number,
            override_agent_id: config.agent_id.as_deref(),
            retell_llm_dynamic_variables: variables,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Retell request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Retell HTTP {}: {}", status, text)));
        }

        let created: CallCreated = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Retell JSON parse error: {}", e)))?;

        tracing::info!(call_id = %created.call_id, "Outbound call created");
        Ok(created)
    }

    /// Check `hex(HMAC-SHA256(api_key, body))` against the signature header.
    pub fn verify_signature(&self, body: &[u8], signature: &str) -> Result<bool, AppError> {
        let config = self.config()?;
        Ok(verify_signature(config.api_key.as_bytes(), body, signature))
    }
}

pub(crate) fn sign(secret: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Some(expected) = sign(secret, body) else {
        return false;
    };
    let provided = signature.trim().to_ascii_lowercase();
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
