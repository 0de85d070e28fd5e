// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unified memory storage over the vector store and the metadata store.
//!
//! This is the only sanctioned entry point to the two backing stores. The
//! write path keeps them consistent (vector first, then metadata; a failure
//! in between is surfaced and logged for reconciliation, never swallowed),
//! and the read path composes full items from both halves, treating partial
//! existence as "not found".

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::counter;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use mnema_core::error::MnemaError;
use mnema_core::traits::MetadataStoreAdapter;
use mnema_core::types::{CategorySet, MemoryFilter, MemoryRecord, VectorHit};

use crate::scoring::MAX_IMPORTANCE;
use crate::types::{MemoryItem, MemoryUpdate, StoreMemoryRequest};
use crate::vector::VectorStore;

/// Vector searches over-fetch by this factor to absorb hydration attrition.
const SEARCH_OVERFETCH: usize = 2;

/// Importance assigned when the caller does not set one.
const DEFAULT_IMPORTANCE: u8 = 1;

/// Snapshot file names used by backup/restore.
const VECTOR_SNAPSHOT: &str = "vectors.json";
const METADATA_SNAPSHOT: &str = "metadata.json";

fn validate_importance(value: u8) -> Result<u8, MnemaError> {
    if (1..=MAX_IMPORTANCE).contains(&value) {
        Ok(value)
    } else {
        Err(MnemaError::validation(
            "importance",
            format!("importance must be within 1..={MAX_IMPORTANCE}, got {value}"),
        ))
    }
}

fn io_err(e: std::io::Error) -> MnemaError {
    MnemaError::Store {
        source: Box::new(e),
    }
}

/// The dual-store memory abstraction.
///
/// Owns write-path consistency (an item exists only once both stores
/// accepted it) and read-path composition (vector text joined with
/// structured metadata).
pub struct MemoryStorage {
    vectors: Arc<VectorStore>,
    metadata: Arc<dyn MetadataStoreAdapter>,
    categories: CategorySet,
}

impl MemoryStorage {
    pub fn new(
        vectors: Arc<VectorStore>,
        metadata: Arc<dyn MetadataStoreAdapter>,
        categories: CategorySet,
    ) -> Self {
        Self {
            vectors,
            metadata,
            categories,
        }
    }

    /// The vector-side facade, shared with the retriever.
    pub fn vectors(&self) -> &Arc<VectorStore> {
        &self.vectors
    }

    /// The category names this storage validates writes against.
    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Stores one memory item in both stores.
    ///
    /// The vector write happens first. If the metadata write fails after it,
    /// the error is surfaced and a reconciliation entry is logged; the
    /// orphaned vector record is left for the caller to retry or delete.
    pub async fn store_memory(
        &self,
        request: StoreMemoryRequest,
    ) -> Result<MemoryItem, MnemaError> {
        self.categories.validate(&request.category)?;
        let importance = validate_importance(request.importance.unwrap_or(DEFAULT_IMPORTANCE))?;
        let id = request
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let created_at = Utc::now();

        let vector_metadata = reserved_vector_metadata(&request, importance, created_at);
        let vector_record = self
            .vectors
            .store_text(&request.content, &id, vector_metadata)
            .await?;

        let record = MemoryRecord {
            id: id.clone(),
            category: request.category,
            source_type: request.source_type,
            source_id: request.source_id,
            importance,
            metadata: request.metadata.unwrap_or_default(),
            created_at,
        };
        if let Err(e) = self.metadata.insert(record.clone()).await {
            error!(
                memory_id = %id,
                error = %e,
                "metadata write failed after vector write; orphaned vector record needs reconciliation"
            );
            counter!("mnema_dual_write_failures_total", "op" => "store").increment(1);
            return Err(e);
        }

        Ok(MemoryItem::compose(record, vector_record))
    }

    /// Stores a batch of items with one batched write per store.
    ///
    /// Every request is validated before any write; an invalid category or
    /// importance anywhere in the batch fails the whole call with zero
    /// writes performed.
    pub async fn batch_store_memory(
        &self,
        requests: Vec<StoreMemoryRequest>,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        let mut prepared = Vec::with_capacity(requests.len());
        for request in requests {
            self.categories.validate(&request.category)?;
            let importance =
                validate_importance(request.importance.unwrap_or(DEFAULT_IMPORTANCE))?;
            let id = request
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let created_at = Utc::now();
            prepared.push((request, importance, id, created_at));
        }
        if prepared.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = prepared.iter().map(|(r, ..)| r.content.clone()).collect();
        let ids: Vec<String> = prepared.iter().map(|(_, _, id, _)| id.clone()).collect();
        let metadatas: Vec<Map<String, Value>> = prepared
            .iter()
            .map(|(request, importance, _, created_at)| {
                reserved_vector_metadata(request, *importance, *created_at)
            })
            .collect();

        let vector_records = self.vectors.batch_store_text(&texts, &ids, metadatas).await?;

        let records: Vec<MemoryRecord> = prepared
            .into_iter()
            .map(|(request, importance, id, created_at)| MemoryRecord {
                id,
                category: request.category,
                source_type: request.source_type,
                source_id: request.source_id,
                importance,
                metadata: request.metadata.unwrap_or_default(),
                created_at,
            })
            .collect();
        if let Err(e) = self.metadata.insert_batch(records.clone()).await {
            error!(
                count = records.len(),
                error = %e,
                "batched metadata write failed after vector write; orphaned vector records need reconciliation"
            );
            counter!("mnema_dual_write_failures_total", "op" => "batch_store").increment(1);
            return Err(e);
        }

        Ok(records
            .into_iter()
            .zip(vector_records)
            .map(|(record, vector)| MemoryItem::compose(record, vector))
            .collect())
    }

    /// Fetches a full item, or `None` when either store is missing the id.
    pub async fn get_memory(&self, id: &str) -> Result<Option<MemoryItem>, MnemaError> {
        let (vector, record) = tokio::join!(self.vectors.get_vector(id), self.metadata.get(id));
        match (vector?, record?) {
            (Some(vector), Some(record)) => Ok(Some(MemoryItem::compose(record, vector))),
            _ => Ok(None),
        }
    }

    /// Applies a partial update to an existing item.
    ///
    /// A `content` change regenerates the embedding; all other fields patch
    /// the metadata store, with reserved filter keys mirrored into vector
    /// metadata. Returns `None` when the metadata store reports not-found.
    pub async fn update_memory(
        &self,
        id: &str,
        update: MemoryUpdate,
    ) -> Result<Option<MemoryItem>, MnemaError> {
        if update.is_empty() {
            return Err(MnemaError::validation(
                "update",
                "update must change at least one field",
            ));
        }
        if let Some(category) = &update.category {
            self.categories.validate(category)?;
        }
        if let Some(importance) = update.importance {
            validate_importance(importance)?;
        }

        let patch = update.metadata_patch();
        if patch.is_empty() {
            // Content-only update: the metadata store still arbitrates existence.
            if self.metadata.get(id).await?.is_none() {
                return Ok(None);
            }
        } else if !self.metadata.update(id, patch).await? {
            return Ok(None);
        }

        // Mirror changed reserved keys (and user metadata) into vector
        // metadata so filtered vector search stays consistent.
        let mut vector_patch = update.metadata.clone().unwrap_or_default();
        if let Some(category) = &update.category {
            vector_patch.insert("category".into(), Value::String(category.clone()));
        }
        if let Some(source_type) = &update.source_type {
            vector_patch.insert("source_type".into(), Value::String(source_type.clone()));
        }
        if let Some(source_id) = &update.source_id {
            vector_patch.insert("source_id".into(), Value::String(source_id.clone()));
        }
        if let Some(importance) = update.importance {
            vector_patch.insert("importance".into(), Value::from(importance));
        }
        let vector_patch = (!vector_patch.is_empty()).then_some(vector_patch);

        let updated = self
            .vectors
            .update_vector(id, update.content.as_deref(), vector_patch)
            .await?;
        if updated.is_none() {
            warn!(
                memory_id = %id,
                "vector record missing during update; dual store out of sync"
            );
            counter!("mnema_dual_write_failures_total", "op" => "update").increment(1);
            return Ok(None);
        }

        self.get_memory(id).await
    }

    /// Deletes an item from both stores.
    ///
    /// Returns `true` only when both sides deleted a record. Backend errors
    /// propagate so the caller can retry the remaining side.
    pub async fn delete_memory(&self, id: &str) -> Result<bool, MnemaError> {
        let (vector, record) = tokio::join!(self.vectors.delete_vector(id), self.metadata.delete(id));
        let vector = vector?;
        let record = record?;
        if vector != record {
            warn!(
                memory_id = %id,
                vector_deleted = vector,
                metadata_deleted = record,
                "dual-store delete mismatch; stores were out of sync"
            );
            counter!("mnema_dual_write_failures_total", "op" => "delete").increment(1);
        }
        Ok(vector && record)
    }

    /// Semantic search by query text, hydrated into full items.
    ///
    /// Over-fetches from the vector store to absorb post-filter attrition,
    /// attaches raw similarity as `relevance`, truncates to `limit`.
    pub async fn search_by_content(
        &self,
        query: &str,
        filter: &MemoryFilter,
        limit: usize,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        let hits = self
            .vectors
            .search_by_text(query, filter, limit * SEARCH_OVERFETCH)
            .await?;
        self.hydrate_hits(hits, limit).await
    }

    /// Semantic search seeded by a raw vector.
    pub async fn search_by_vector(
        &self,
        vector: &[f32],
        filter: &MemoryFilter,
        limit: usize,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        let hits = self
            .vectors
            .search_by_vector(vector, filter, limit * SEARCH_OVERFETCH)
            .await?;
        self.hydrate_hits(hits, limit).await
    }

    async fn hydrate_hits(
        &self,
        hits: Vec<VectorHit>,
        limit: usize,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        let fetches = join_all(hits.iter().map(|hit| self.get_memory(&hit.id))).await;
        let mut items = Vec::with_capacity(hits.len());
        for (hit, fetched) in hits.iter().zip(fetches) {
            match fetched? {
                Some(item) => items.push(item.with_relevance(hit.score)),
                None => {
                    debug!(memory_id = %hit.id, "vector hit without metadata record; skipped");
                }
            }
        }
        items.truncate(limit);
        Ok(items)
    }

    /// Metadata-only filtered listing, newest first, no ranking.
    pub async fn search_by_metadata(
        &self,
        filter: &MemoryFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        let records = self.metadata.list(filter, limit, offset).await?;
        let fetches = join_all(
            records
                .iter()
                .map(|record| self.vectors.get_vector(&record.id)),
        )
        .await;

        let mut items = Vec::with_capacity(records.len());
        for (record, vector) in records.into_iter().zip(fetches) {
            match vector? {
                Some(vector) => items.push(MemoryItem::compose(record, vector)),
                None => {
                    debug!(memory_id = %record.id, "metadata record without vector record; skipped");
                }
            }
        }
        Ok(items)
    }

    /// Unions semantic and metadata search results.
    ///
    /// Both searches run concurrently. On id collision the vector-search
    /// copy wins (it carries the similarity); the union is sorted by
    /// `relevance` descending and truncated to `limit`.
    pub async fn hybrid_search(
        &self,
        query: &str,
        filter: &MemoryFilter,
        limit: usize,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        let (semantic, listed) = tokio::join!(
            self.search_by_content(query, filter, limit),
            self.search_by_metadata(filter, limit, 0)
        );

        let mut seen: HashSet<String> = HashSet::new();
        let mut merged: Vec<MemoryItem> = Vec::new();
        for item in semantic?.into_iter().chain(listed?) {
            if seen.insert(item.id.clone()) {
                merged.push(item);
            }
        }
        merged.sort_by(|a, b| {
            b.relevance
                .unwrap_or(0.0)
                .partial_cmp(&a.relevance.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        merged.truncate(limit);
        Ok(merged)
    }

    /// All items in one category, newest first.
    pub async fn get_by_category(
        &self,
        category: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        self.search_by_metadata(&MemoryFilter::category(category), limit, offset)
            .await
    }

    /// All items from one provenance pointer, newest first.
    pub async fn get_by_source(
        &self,
        source_type: &str,
        source_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        self.search_by_metadata(&MemoryFilter::source(source_type, source_id), limit, offset)
            .await
    }

    /// The most recently created items.
    pub async fn get_recent_memories(&self, limit: usize) -> Result<Vec<MemoryItem>, MnemaError> {
        self.search_by_metadata(&MemoryFilter::default(), limit, 0)
            .await
    }

    /// Counts items matching the filter.
    pub async fn count_memories(&self, filter: &MemoryFilter) -> Result<u64, MnemaError> {
        self.metadata.count(filter).await
    }

    /// Item counts aggregated by category.
    pub async fn count_by_category(&self) -> Result<HashMap<String, u64>, MnemaError> {
        self.metadata.count_by_category().await
    }

    /// Snapshots both stores into `dir`. Succeeds only if both do.
    pub async fn create_backup(&self, dir: &Path) -> Result<(), MnemaError> {
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
        self.vectors.backup(&dir.join(VECTOR_SNAPSHOT)).await?;
        self.metadata.backup(&dir.join(METADATA_SNAPSHOT)).await?;
        debug!(dir = %dir.display(), "memory backup complete");
        Ok(())
    }

    /// Restores both stores from snapshots in `dir`. Succeeds only if both do.
    pub async fn restore_from_backup(&self, dir: &Path) -> Result<(), MnemaError> {
        self.vectors.restore(&dir.join(VECTOR_SNAPSHOT)).await?;
        self.metadata.restore(&dir.join(METADATA_SNAPSHOT)).await?;
        debug!(dir = %dir.display(), "memory restore complete");
        Ok(())
    }

    /// Runs housekeeping on both stores. Succeeds only if both do.
    pub async fn optimize(&self) -> Result<(), MnemaError> {
        let (vector, metadata) = tokio::join!(self.vectors.optimize(), self.metadata.optimize());
        vector?;
        metadata?;
        Ok(())
    }
}

/// Builds the vector-record metadata for a new item: user metadata plus the
/// reserved keys filtered vector search matches against.
fn reserved_vector_metadata(
    request: &StoreMemoryRequest,
    importance: u8,
    created_at: DateTime<Utc>,
) -> Map<String, Value> {
    let mut metadata = request.metadata.clone().unwrap_or_default();
    metadata.insert(
        "category".into(),
        Value::String(request.category.clone()),
    );
    if let Some(source_type) = &request.source_type {
        metadata.insert("source_type".into(), Value::String(source_type.clone()));
    }
    if let Some(source_id) = &request.source_id {
        metadata.insert("source_id".into(), Value::String(source_id.clone()));
    }
    metadata.insert("importance".into(), Value::from(importance));
    metadata.insert(
        "created_at".into(),
        Value::String(created_at.to_rfc3339()),
    );
    metadata
}
