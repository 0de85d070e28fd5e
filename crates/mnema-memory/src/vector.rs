// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-oriented adapter over the embedding provider and the vector index.
//!
//! Callers hand in text; this adapter owns embedding generation, stamps the
//! embedding model id into record metadata, and delegates persistence and
//! search to the index. All effects are visible once a call returns.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use mnema_core::error::MnemaError;
use mnema_core::traits::{EmbeddingAdapter, VectorIndexAdapter};
use mnema_core::types::{MemoryFilter, VectorHit, VectorRecord};

/// Reserved metadata key recording which model produced a stored vector.
pub const EMBEDDING_MODEL_KEY: &str = "embedding_model";

/// Text-oriented facade over the embedding provider and vector index.
pub struct VectorStore {
    embedder: Arc<dyn EmbeddingAdapter>,
    index: Arc<dyn VectorIndexAdapter>,
}

impl VectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingAdapter>, index: Arc<dyn VectorIndexAdapter>) -> Self {
        Self { embedder, index }
    }

    /// The embedding provider this store writes with.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingAdapter> {
        &self.embedder
    }

    /// Embeds `text` and persists it under `id`.
    ///
    /// The embedding model id is stamped into the stored metadata so a
    /// mixed-model index stays diagnosable. Returns the stored record.
    pub async fn store_text(
        &self,
        text: &str,
        id: &str,
        mut metadata: Map<String, Value>,
    ) -> Result<VectorRecord, MnemaError> {
        let vector = self.embedder.embed(text).await?;
        metadata.insert(
            EMBEDDING_MODEL_KEY.to_string(),
            Value::String(self.embedder.model_id().to_string()),
        );
        let record = VectorRecord {
            id: id.to_string(),
            vector,
            text: text.to_string(),
            metadata,
        };
        self.index.upsert(record.clone()).await?;
        Ok(record)
    }

    /// Stores N texts with one batched embedding call and one batched upsert.
    ///
    /// All three inputs must have equal length.
    pub async fn batch_store_text(
        &self,
        texts: &[String],
        ids: &[String],
        metadatas: Vec<Map<String, Value>>,
    ) -> Result<Vec<VectorRecord>, MnemaError> {
        if texts.len() != ids.len() || texts.len() != metadatas.len() {
            return Err(MnemaError::validation(
                "batch",
                format!(
                    "mismatched batch lengths: {} texts, {} ids, {} metadata maps",
                    texts.len(),
                    ids.len(),
                    metadatas.len()
                ),
            ));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.embedder.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(MnemaError::embedding(format!(
                "provider returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        let model = self.embedder.model_id().to_string();
        let records: Vec<VectorRecord> = texts
            .iter()
            .zip(ids)
            .zip(vectors.into_iter().zip(metadatas))
            .map(|((text, id), (vector, mut metadata))| {
                metadata.insert(
                    EMBEDDING_MODEL_KEY.to_string(),
                    Value::String(model.clone()),
                );
                VectorRecord {
                    id: id.clone(),
                    vector,
                    text: text.clone(),
                    metadata,
                }
            })
            .collect();

        self.index.upsert_batch(records.clone()).await?;
        Ok(records)
    }

    /// Updates text and/or metadata of a stored record.
    ///
    /// At least one of `text`/`metadata` must be supplied. Supplying `text`
    /// regenerates the embedding; a metadata-only change does not. Metadata
    /// merges key-by-key into the stored map. Returns `None` when no record
    /// exists under `id`.
    pub async fn update_vector(
        &self,
        id: &str,
        text: Option<&str>,
        metadata: Option<Map<String, Value>>,
    ) -> Result<Option<VectorRecord>, MnemaError> {
        if text.is_none() && metadata.is_none() {
            return Err(MnemaError::validation(
                "update",
                "at least one of text or metadata must be supplied",
            ));
        }
        let Some(mut record) = self.index.get(id).await? else {
            return Ok(None);
        };

        if let Some(text) = text {
            record.vector = self.embedder.embed(text).await?;
            record.text = text.to_string();
            record.metadata.insert(
                EMBEDDING_MODEL_KEY.to_string(),
                Value::String(self.embedder.model_id().to_string()),
            );
        }
        if let Some(metadata) = metadata {
            for (key, value) in metadata {
                record.metadata.insert(key, value);
            }
        }

        self.index.upsert(record.clone()).await?;
        debug!(id, re_embedded = text.is_some(), "vector record updated");
        Ok(Some(record))
    }

    /// Deletes a record. Idempotent; returns whether one existed.
    pub async fn delete_vector(&self, id: &str) -> Result<bool, MnemaError> {
        self.index.delete(id).await
    }

    /// Embeds `query` and searches the index.
    pub async fn search_by_text(
        &self,
        query: &str,
        filter: &MemoryFilter,
        limit: usize,
    ) -> Result<Vec<VectorHit>, MnemaError> {
        let vector = self.embedder.embed(query).await?;
        self.index.search(&vector, limit, filter).await
    }

    /// Searches the index with a caller-supplied vector.
    pub async fn search_by_vector(
        &self,
        vector: &[f32],
        filter: &MemoryFilter,
        limit: usize,
    ) -> Result<Vec<VectorHit>, MnemaError> {
        self.index.search(vector, limit, filter).await
    }

    /// Fetches a stored record by id.
    pub async fn get_vector(&self, id: &str) -> Result<Option<VectorRecord>, MnemaError> {
        self.index.get(id).await
    }

    /// Counts records matching the filter.
    pub async fn count_vectors(&self, filter: &MemoryFilter) -> Result<u64, MnemaError> {
        self.index.count(filter).await
    }

    /// Writes an index snapshot to `path`.
    pub async fn backup(&self, path: &Path) -> Result<(), MnemaError> {
        self.index.backup(path).await
    }

    /// Replaces the index contents from a snapshot at `path`.
    pub async fn restore(&self, path: &Path) -> Result<(), MnemaError> {
        self.index.restore(path).await
    }

    /// Index housekeeping.
    pub async fn optimize(&self) -> Result<(), MnemaError> {
        self.index.optimize().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnema_storage::InMemoryVectorIndex;
    use mnema_test_utils::{FailingEmbedder, HashEmbedder};

    fn store() -> VectorStore {
        VectorStore::new(
            Arc::new(HashEmbedder::new(64)),
            Arc::new(InMemoryVectorIndex::new()),
        )
    }

    #[tokio::test]
    async fn store_text_stamps_embedding_model() {
        let store = store();
        let record = store
            .store_text("the user likes espresso", "v-1", Map::new())
            .await
            .unwrap();
        assert_eq!(record.vector.len(), 64);
        assert_eq!(
            record.metadata.get(EMBEDDING_MODEL_KEY).unwrap(),
            "hash-embedder"
        );

        let fetched = store.get_vector("v-1").await.unwrap().unwrap();
        assert_eq!(fetched.text, "the user likes espresso");
    }

    #[tokio::test]
    async fn store_text_surfaces_embedding_failure() {
        let store = VectorStore::new(
            Arc::new(FailingEmbedder::new()),
            Arc::new(InMemoryVectorIndex::new()),
        );
        let result = store.store_text("anything", "v-1", Map::new()).await;
        assert!(matches!(result, Err(MnemaError::Embedding { .. })));
        assert!(store.get_vector("v-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn batch_store_rejects_mismatched_lengths() {
        let store = store();
        let result = store
            .batch_store_text(
                &["a".into(), "b".into()],
                &["id-1".into()],
                vec![Map::new(), Map::new()],
            )
            .await;
        assert!(matches!(result, Err(MnemaError::Validation { .. })));
    }

    #[tokio::test]
    async fn batch_store_persists_all_records() {
        let store = store();
        let records = store
            .batch_store_text(
                &["first".into(), "second".into()],
                &["id-1".into(), "id-2".into()],
                vec![Map::new(), Map::new()],
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(store.get_vector("id-1").await.unwrap().is_some());
        assert!(store.get_vector("id-2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn batch_store_empty_is_a_noop() {
        let store = store();
        let records = store.batch_store_text(&[], &[], vec![]).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn update_requires_text_or_metadata() {
        let store = store();
        let result = store.update_vector("v-1", None, None).await;
        assert!(matches!(result, Err(MnemaError::Validation { .. })));
    }

    #[tokio::test]
    async fn update_with_text_regenerates_embedding() {
        let store = store();
        let original = store
            .store_text("original content", "v-1", Map::new())
            .await
            .unwrap();

        let updated = store
            .update_vector("v-1", Some("entirely different content"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "entirely different content");
        assert_ne!(updated.vector, original.vector);
    }

    #[tokio::test]
    async fn metadata_only_update_keeps_embedding() {
        let store = store();
        let original = store
            .store_text("stable content", "v-1", Map::new())
            .await
            .unwrap();

        let mut patch = Map::new();
        patch.insert("pinned".into(), Value::Bool(true));
        let updated = store
            .update_vector("v-1", None, Some(patch))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.vector, original.vector);
        assert_eq!(updated.metadata.get("pinned"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn update_missing_record_returns_none() {
        let store = store();
        let result = store
            .update_vector("ghost", Some("text"), None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = store();
        store.store_text("x", "v-1", Map::new()).await.unwrap();
        assert!(store.delete_vector("v-1").await.unwrap());
        assert!(!store.delete_vector("v-1").await.unwrap());
    }

    #[tokio::test]
    async fn search_by_text_finds_identical_content_first() {
        let store = store();
        store
            .store_text("rust borrow checker", "v-1", Map::new())
            .await
            .unwrap();
        store
            .store_text("gardening tips for spring", "v-2", Map::new())
            .await
            .unwrap();

        let hits = store
            .search_by_text("rust borrow checker", &MemoryFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(hits[0].id, "v-1");
        assert!((hits[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn count_vectors_passthrough() {
        let store = store();
        store.store_text("a", "v-1", Map::new()).await.unwrap();
        store.store_text("b", "v-2", Map::new()).await.unwrap();
        assert_eq!(store.count_vectors(&MemoryFilter::default()).await.unwrap(), 2);
    }
}
