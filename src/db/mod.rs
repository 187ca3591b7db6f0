//! Database layer.
//!
//! All persistence goes through the [`DocumentStore`] trait: a schemaless
//! document database addressed by collection and key, queried by equality
//! filters. [`Store`] is the typed facade the services use.

pub mod firestore;
pub mod memory;
pub mod store;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use store::{Store, Stored};

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WEAPONS: &str = "entregas_armas";
    /// Ammo and vest requests attached to an issued weapon
    pub const WEAPON_REQUESTS: &str = "solicitudes_arma";
    pub const DELIVERIES: &str = "entregas_productos";
    pub const TICKETS: &str = "tickets_dinero";
    pub const TIME_ENTRIES: &str = "fichajes";
    pub const WEEKS: &str = "semanas";
    pub const GOALS: &str = "metas";
    /// Append-only ledger of confirmed tickets (goal source of truth)
    pub const GOAL_EVENTS: &str = "metas_eventos";
    pub const VEST_REQUESTS: &str = "solicitudes_chalecos";
    pub const DEPOSITS: &str = "depositos_dinero_negro";
    pub const TUNINGS: &str = "tuneos";
}

/// A raw document as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    /// Store-managed revision, 1 on create and incremented on every replace.
    pub version: u64,
    pub data: Value,
}

/// Scalar value usable in an equality filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

/// `field == value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: FieldValue,
}

impl FieldFilter {
    pub fn eq(field: &str, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Whether a document body satisfies this filter.
    pub fn matches(&self, data: &Value) -> bool {
        data.get(&self.field) == Some(&self.value.to_json())
    }
}

/// Schemaless document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by key.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    /// Create a document; fails with `Conflict` if the key already exists.
    async fn create(&self, collection: &str, id: &str, data: Value)
        -> Result<Document, AppError>;

    /// Replace a document if its current version equals `expected_version`.
    async fn replace(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        expected_version: u64,
    ) -> Result<Document, AppError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError>;

    /// Delete a document only if it is still at `expected_version`.
    ///
    /// `NotFound` if it is gone, `Conflict` if it changed since it was read.
    async fn delete_if_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
    ) -> Result<(), AppError>;

    /// All documents matching every filter.
    async fn find_eq(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Document>, AppError>;

    /// Full collection scan.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError>;
}

/// Connect the configured backend. Called once at startup and awaited
/// before the server accepts requests.
pub async fn connect(config: &Config) -> Result<Store, AppError> {
    let backend: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreStore::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(Store::new(backend))
}
