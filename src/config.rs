//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets as environment variables, so everything is read
//! once at startup and cached in memory.

use chrono_tz::Tz;
use std::env;

/// Timezone of the clan's server when `CIVIL_TIMEZONE` is unset.
pub const DEFAULT_CIVIL_TIMEZONE: Tz = chrono_tz::Europe::Madrid;

/// Which document store backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Credentials for the outbound calling API.
#[derive(Debug, Clone)]
pub struct RetellConfig {
    pub api_url: String,
    pub api_key: String,
    pub agent_id: Option<String>,
    pub from_number: Option<String>,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Document store selection
    pub store_backend: StoreBackend,
    /// IANA timezone used for day and week boundaries
    pub civil_timezone: Tz,
    /// Workflow-automation webhook receiving chat messages
    pub chat_webhook_url: Option<String>,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Optional bootstrap account, created as `jefe` if missing
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Calling API credentials (absent disables the proxy)
    pub retell: Option<RetellConfig>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            civil_timezone: DEFAULT_CIVIL_TIMEZONE,
            chat_webhook_url: None,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            admin_username: None,
            admin_password: None,
            retell: Some(RetellConfig {
                api_url: "http://127.0.0.1:9".to_string(),
                api_key: "test_retell_key".to_string(),
                agent_id: Some("agent_test".to_string()),
                from_number: Some("+34600000000".to_string()),
            }),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_lowercase()
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            _ => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        let civil_timezone = match optional_var("CIVIL_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| ConfigError::Invalid("CIVIL_TIMEZONE"))?,
            None => DEFAULT_CIVIL_TIMEZONE,
        };

        let retell = optional_var("RETELL_API_KEY").map(|api_key| RetellConfig {
            api_url: env::var("RETELL_API_URL")
                .unwrap_or_else(|_| "https://api.retellai.com".to_string()),
            api_key,
            agent_id: optional_var("RETELL_AGENT_ID"),
            from_number: optional_var("RETELL_FROM_NUMBER"),
        });

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend,
            civil_timezone,
            chat_webhook_url: optional_var("CHAT_WEBHOOK_URL"),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            admin_username: optional_var("ADMIN_USERNAME"),
            admin_password: optional_var("ADMIN_PASSWORD"),
            retell,
        })
    }

    /// The civil timezone.
    pub fn civil_tz(&self) -> Tz {
        self.civil_timezone
    }
}

/// Read a trimmed, non-empty environment variable.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
