// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed facade over a [`DocumentStore`].

use crate::db::{Document, DocumentStore, FieldFilter};
use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Attempts made by [`Store::update`] before giving up on a contended document.
const MAX_UPDATE_ATTEMPTS: usize = 5;

/// A typed document together with its key and revision.
#[derive(Debug, Clone)]
pub struct Stored<T> {
    pub id: String,
    pub version: u64,
    pub doc: T,
}

/// Cloneable handle to the application's document store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn DocumentStore>,
}

impl Store {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self { inner }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Stored<T>>, AppError> {
        self.inner
            .get(collection, id)
            .await?
            .map(|doc| decode(collection, doc))
            .transpose()
    }

    /// Like [`Store::get`] but a missing document is an error.
    pub async fn require<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        what: &str,
    ) -> Result<Stored<T>, AppError> {
        self.get(collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
    }

    /// Insert under a server-generated key.
    pub async fn insert<T: Serialize + DeserializeOwned>(
        &self,
        collection: &str,
        doc: &T,
    ) -> Result<Stored<T>, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.insert_with_id(collection, &id, doc).await
    }

    /// Insert under a caller-chosen key; `Conflict` if it is taken.
    pub async fn insert_with_id<T: Serialize + DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> Result<Stored<T>, AppError> {
        let created = self.inner.create(collection, id, encode(doc)?).await?;
        decode(collection, created)
    }

    /// Compare-and-swap write of a previously read document.
    pub async fn replace<T: Serialize + DeserializeOwned>(
        &self,
        collection: &str,
        stored: &Stored<T>,
    ) -> Result<Stored<T>, AppError> {
        let written = self
            .inner
            .replace(collection, &stored.id, encode(&stored.doc)?, stored.version)
            .await?;
        decode(collection, written)
    }

    /// Read-modify-write with optimistic retries.
    ///
    /// `mutate` runs against a fresh copy on every attempt; returning an error
    /// aborts without writing. Returns the written document.
    pub async fn update<T, F>(
        &self,
        collection: &str,
        id: &str,
        what: &str,
        mut mutate: F,
    ) -> Result<Stored<T>, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(&mut T) -> Result<(), AppError>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut current: Stored<T> = self.require(collection, id, what).await?;
            mutate(&mut current.doc)?;

            match self.replace(collection, &current).await {
                Err(e) if e.is_conflict() && attempt < MAX_UPDATE_ATTEMPTS => {
                    tracing::debug!(collection, id, attempt, "Retrying contended update");
                }
                other => return other,
            }
        }
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.inner.delete(collection, id).await
    }

    /// Delete a previously read document unless it changed since the read.
    pub async fn delete_unchanged<T>(
        &self,
        collection: &str,
        stored: &Stored<T>,
    ) -> Result<(), AppError> {
        self.inner
            .delete_if_version(collection, &stored.id, stored.version)
            .await
    }

    pub async fn find_eq<T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Stored<T>>, AppError> {
        self.inner
            .find_eq(collection, filters)
            .await?
            .into_iter()
            .map(|doc| decode(collection, doc))
            .collect()
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<Stored<T>>, AppError> {
        self.inner
            .list(collection)
            .await?
            .into_iter()
            .map(|doc| decode(collection, doc))
            .collect()
    }
}

fn encode<T: Serialize>(doc: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(doc)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode document: {}", e)))
}

fn decode<T: DeserializeOwned>(collection: &str, doc: Document) -> Result<Stored<T>, AppError> {
    let parsed = serde_json::from_value(doc.data).map_err(|e| {
        AppError::Database(format!(
            "Malformed document {}/{}: {}",
            collection, doc.id, e
        ))
    })?;
    Ok(Stored {
        id: doc.id,
        version: doc.version,
        doc: parsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Counter {
        n: u32,
    }

    fn store() -> Store {
        Store::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_insert_generates_key() {
        let store = store();
        let a = store.insert("c", &Counter { n: 1 }).await.unwrap();
        let b = store.insert("c", &Counter { n: 1 }).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.version, 1);
    }

    #[tokio::test]
    async fn test_update_abort_leaves_document() {
        let store = store();
        store
            .insert_with_id("c", "k", &Counter { n: 1 })
            .await
            .unwrap();

        let err = store
            .update::<Counter, _>("c", "k", "counter", |_| {
                Err(AppError::InvalidState("nope".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let current: Stored<Counter> = store.require("c", "k", "counter").await.unwrap();
        assert_eq!(current.doc.n, 1);
        assert_eq!(current.version, 1);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let store = store();
        store
            .insert_with_id("c", "k", &Counter { n: 0 })
            .await
            .unwrap();

        let mut handles = vec![];
        for _ in 0..4 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update::<Counter, _>("c", "k", "counter", |c| {
                        c.n += 1;
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let current: Stored<Counter> = store.require("c", "k", "counter").await.unwrap();
        assert_eq!(current.doc.n, 4);
    }

    #[tokio::test]
    async fn test_malformed_document_is_database_error() {
        let store = store();
        store
            .insert_with_id("c", "k", &serde_json::json!({"n": "text"}))
            .await
            .unwrap();

        let err = store.get::<Counter>("c", "k").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
