// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore implementation of [`DocumentStore`].
//!
//! Documents are stored as-is with two bookkeeping fields added:
//! - `_id`: the document key (queries return bodies only)
//! - `_version`: the revision used for compare-and-swap replaces

use crate::db::{Document, DocumentStore, FieldFilter, FieldValue};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use serde_json::{Map, Value};

const ID_FIELD: &str = "_id";
const VERSION_FIELD: &str = "_version";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Read a document together with its server update time, which guards
    /// the conditional writes in `replace` and `delete_if_version`.
    async fn read_current(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<(Document, DateTime<Utc>)>, AppError> {
        let raw = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let update_time = raw
            .update_time
            .clone()
            .ok_or_else(|| {
                AppError::Database(format!("{}/{} has no update time", collection, id))
            })
            .and_then(|ts| {
                firestore::timestamp_utils::from_timestamp(ts)
                    .map_err(|e| AppError::Database(e.to_string()))
            })?;
        let body = firestore::FirestoreDb::deserialize_doc_to::<Value>(&raw)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some((unwrap_doc(collection, Some(id), body)?, update_time)))
    }

    /// Read a document and check it is still at `expected_version`.
    async fn read_at_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
    ) -> Result<DateTime<Utc>, AppError> {
        let (current, update_time) = self
            .read_current(collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;

        if current.version != expected_version {
            return Err(stale(collection, id, expected_version, current.version));
        }
        Ok(update_time)
    }
}

fn stale(collection: &str, id: &str, expected: u64, found: u64) -> AppError {
    AppError::Conflict(format!(
        "{}/{} was modified concurrently (expected v{}, found v{})",
        collection, id, expected, found
    ))
}

/// Map the error of a write made under an update-time precondition.
///
/// A failed precondition means another writer got there first.
fn conditional_write_error(collection: &str, id: &str, err: FirestoreError) -> AppError {
    match err {
        FirestoreError::DatabaseError(e) if e.public.code == "FailedPrecondition" => {
            AppError::Conflict(format!("{}/{} was modified concurrently", collection, id))
        }
        FirestoreError::DataNotFoundError(_) => {
            AppError::NotFound(format!("{}/{}", collection, id))
        }
        e => AppError::Database(e.to_string()),
    }
}

/// Attach bookkeeping fields to a document body.
fn wrap(id: &str, version: u64, data: Value) -> Result<Value, AppError> {
    let mut map = match data {
        Value::Object(map) => map,
        _ => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Only JSON objects can be stored as documents"
            )))
        }
    };
    map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    map.insert(VERSION_FIELD.to_string(), Value::from(version));
    Ok(Value::Object(map))
}

/// Split a stored body back into a [`Document`].
fn unwrap_doc(collection: &str, fallback_id: Option<&str>, raw: Value) -> Result<Document, AppError> {
    let mut map: Map<String, Value> = match raw {
        Value::Object(map) => map,
        _ => {
            return Err(AppError::Database(format!(
                "Non-object document in {}",
                collection
            )))
        }
    };

    let id = match map.remove(ID_FIELD) {
        Some(Value::String(id)) => id,
        _ => fallback_id
            .map(str::to_string)
            .ok_or_else(|| AppError::Database(format!("Document in {} has no _id", collection)))?,
    };
    // Documents written before versioning count as revision 1
    let version = map
        .remove(VERSION_FIELD)
        .and_then(|v| v.as_u64())
        .unwrap_or(1);

    Ok(Document {
        id,
        version,
        data: Value::Object(map),
    })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self
            .read_current(collection, id)
            .await?
            .map(|(doc, _)| doc))
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Document, AppError> {
        let body = wrap(id, 1, data.clone())?;

        let result: Result<Value, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(id)
            .object(&body)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(Document {
                id: id.to_string(),
                version: 1,
                data,
            }),
            Err(FirestoreError::DataConflictError(_)) => Err(
                AppError::Conflict(format!("{}/{} already exists", collection, id)),
            ),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        expected_version: u64,
    ) -> Result<Document, AppError> {
        let update_time = self.read_at_version(collection, id, expected_version).await?;

        let next_version = expected_version + 1;
        let body = wrap(id, next_version, data.clone())?;

        // The write only lands if nobody touched the document since the read
        let result: Result<Value, _> = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .precondition(FirestoreWritePrecondition::UpdateTime(update_time))
            .document_id(id)
            .object(&body)
            .execute()
            .await;
        result.map_err(|e| conditional_write_error(collection, id, e))?;

        Ok(Document {
            id: id.to_string(),
            version: next_version,
            data,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_if_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
    ) -> Result<(), AppError> {
        let update_time = self.read_at_version(collection, id, expected_version).await?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .precondition(FirestoreWritePrecondition::UpdateTime(update_time))
            .document_id(id)
            .execute()
            .await
            .map_err(|e| conditional_write_error(collection, id, e))
    }

    async fn find_eq(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Document>, AppError> {
        let filters = filters.to_vec();

        let rows: Vec<Value> = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| {
                q.for_all(filters.iter().map(|f| {
                    let field = q.field(f.field.as_str());
                    match &f.value {
                        FieldValue::Str(s) => field.eq(s.clone()),
                        FieldValue::Int(i) => field.eq(*i),
                        FieldValue::Bool(b) => field.eq(*b),
                    }
                }))
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|raw| unwrap_doc(collection, None, raw))
            .collect()
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        let rows: Vec<Value> = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|raw| unwrap_doc(collection, None, raw))
            .collect()
    }
}
