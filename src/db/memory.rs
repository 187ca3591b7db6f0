// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store.
//!
//! Used by tests and by `STORE_BACKEND=memory`. Each collection sits behind
//! one dashmap shard entry, so compare-and-swap on a document is atomic.

use crate::db::{Document, DocumentStore, FieldFilter};
use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Collection name -> (document id -> document)
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection (test helper).
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|c| c.get(id).cloned()))
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Document, AppError> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(AppError::Conflict(format!(
                "{}/{} already exists",
                collection, id
            )));
        }

        let doc = Document {
            id: id.to_string(),
            version: 1,
            data,
        };
        docs.insert(id.to_string(), doc.clone());
        Ok(doc)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        expected_version: u64,
    ) -> Result<Document, AppError> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let current = docs
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;

        if current.version != expected_version {
            return Err(AppError::Conflict(format!(
                "{}/{} was modified concurrently (expected v{}, found v{})",
                collection, id, expected_version, current.version
            )));
        }

        current.version += 1;
        current.data = data;
        Ok(current.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        if let Some(mut docs) = self.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn delete_if_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
    ) -> Result<(), AppError> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let current = docs
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;

        if current.version != expected_version {
            return Err(AppError::Conflict(format!(
                "{}/{} was modified concurrently (expected v{}, found v{})",
                collection, id, expected_version, current.version
            )));
        }

        docs.remove(id);
        Ok(())
    }

    async fn find_eq(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Document>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filters.iter().all(|f| f.matches(&doc.data)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_rejects_duplicate_key() {
        let store = MemoryStore::new();
        store.create("c", "a", json!({"n": 1})).await.unwrap();

        let err = store.create("c", "a", json!({"n": 2})).await.unwrap_err();
        assert!(err.is_conflict());

        let doc = store.get("c", "a").await.unwrap().unwrap();
        assert_eq!(doc.data["n"], 1);
    }

    #[tokio::test]
    async fn test_replace_checks_version() {
        let store = MemoryStore::new();
        let doc = store.create("c", "a", json!({"n": 1})).await.unwrap();
        assert_eq!(doc.version, 1);

        let updated = store.replace("c", "a", json!({"n": 2}), 1).await.unwrap();
        assert_eq!(updated.version, 2);

        // Stale writer loses
        let err = store.replace("c", "a", json!({"n": 3}), 1).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.get("c", "a").await.unwrap().unwrap().data["n"], 2);
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.replace("c", "nope", json!({}), 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_eq_and_delete() {
        let store = MemoryStore::new();
        store.create("c", "a", json!({"u": "x"})).await.unwrap();
        store.create("c", "b", json!({"u": "y"})).await.unwrap();

        let found = store
            .find_eq("c", &[FieldFilter::eq("u", "y")])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");

        store.delete("c", "b").await.unwrap();
        assert_eq!(store.count("c"), 1);
        assert!(store.list("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_if_version_keeps_changed_document() {
        let store = MemoryStore::new();
        store.create("c", "a", json!({"estado": "pendiente"})).await.unwrap();
        store
            .replace("c", "a", json!({"estado": "entregada"}), 1)
            .await
            .unwrap();

        let err = store.delete_if_version("c", "a", 1).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.count("c"), 1);

        store.delete_if_version("c", "a", 2).await.unwrap();
        assert_eq!(store.count("c"), 0);

        let err = store.delete_if_version("c", "a", 2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
