// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory metadata store with filtered listing and category aggregation.
//!
//! The reference backend for [`MetadataStoreAdapter`]. Listing order is
//! newest-first by `created_at`, with the record id as a stable secondary
//! key so equal timestamps do not shuffle between calls.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use mnema_core::error::MnemaError;
use mnema_core::traits::{MetadataStoreAdapter, PluginAdapter};
use mnema_core::types::{AdapterType, HealthStatus, MemoryFilter, MemoryRecord, MetadataPatch};

/// In-memory [`MetadataStoreAdapter`] implementation.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<String, MemoryRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn io_err(e: std::io::Error) -> MnemaError {
    MnemaError::Store {
        source: Box::new(e),
    }
}

fn json_err(e: serde_json::Error) -> MnemaError {
    MnemaError::Store {
        source: Box::new(e),
    }
}

#[async_trait]
impl PluginAdapter for InMemoryMetadataStore {
    fn name(&self) -> &str {
        "in-memory-metadata-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MetadataStore
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemaError> {
        Ok(())
    }
}

#[async_trait]
impl MetadataStoreAdapter for InMemoryMetadataStore {
    async fn insert(&self, record: MemoryRecord) -> Result<(), MnemaError> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn insert_batch(&self, records: Vec<MemoryRecord>) -> Result<(), MnemaError> {
        let mut guard = self.records.write().await;
        for record in records {
            guard.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, MnemaError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: MetadataPatch) -> Result<bool, MnemaError> {
        let mut guard = self.records.write().await;
        let Some(record) = guard.get_mut(id) else {
            return Ok(false);
        };
        if let Some(category) = patch.category {
            record.category = category;
        }
        if let Some(source_type) = patch.source_type {
            record.source_type = Some(source_type);
        }
        if let Some(source_id) = patch.source_id {
            record.source_id = Some(source_id);
        }
        if let Some(importance) = patch.importance {
            record.importance = importance;
        }
        if let Some(metadata) = patch.metadata {
            for (key, value) in metadata {
                record.metadata.insert(key, value);
            }
        }
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, MnemaError> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn list(
        &self,
        filter: &MemoryFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MemoryRecord>, MnemaError> {
        let guard = self.records.read().await;
        let mut matching: Vec<MemoryRecord> = guard
            .values()
            .filter(|record| filter.matches_record(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, filter: &MemoryFilter) -> Result<u64, MnemaError> {
        let guard = self.records.read().await;
        Ok(guard
            .values()
            .filter(|record| filter.matches_record(record))
            .count() as u64)
    }

    async fn count_by_category(&self) -> Result<HashMap<String, u64>, MnemaError> {
        let guard = self.records.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for record in guard.values() {
            *counts.entry(record.category.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn backup(&self, path: &Path) -> Result<(), MnemaError> {
        let records: Vec<MemoryRecord> = self.records.read().await.values().cloned().collect();
        let bytes = serde_json::to_vec(&records).map_err(json_err)?;
        tokio::fs::write(path, bytes).await.map_err(io_err)?;
        debug!(path = %path.display(), count = records.len(), "metadata store snapshot written");
        Ok(())
    }

    async fn restore(&self, path: &Path) -> Result<(), MnemaError> {
        let bytes = tokio::fs::read(path).await.map_err(io_err)?;
        let records: Vec<MemoryRecord> = serde_json::from_slice(&bytes).map_err(json_err)?;
        let mut guard = self.records.write().await;
        guard.clear();
        for record in records {
            guard.insert(record.id.clone(), record);
        }
        debug!(path = %path.display(), count = guard.len(), "metadata store snapshot restored");
        Ok(())
    }

    async fn optimize(&self) -> Result<(), MnemaError> {
        self.records.write().await.shrink_to_fit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::Map;

    fn record(id: &str, category: &str, age_hours: i64) -> MemoryRecord {
        MemoryRecord {
            id: id.into(),
            category: category.into(),
            source_type: None,
            source_id: None,
            importance: 1,
            metadata: Map::new(),
            created_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    #[tokio::test]
    async fn insert_get_delete_roundtrip() {
        let store = InMemoryMetadataStore::new();
        store.insert(record("m-1", "document", 0)).await.unwrap();

        let fetched = store.get("m-1").await.unwrap().unwrap();
        assert_eq!(fetched.category, "document");

        assert!(store.delete("m-1").await.unwrap());
        assert!(!store.delete("m-1").await.unwrap());
    }

    #[tokio::test]
    async fn update_patches_fields_and_merges_metadata() {
        let store = InMemoryMetadataStore::new();
        let mut initial = record("m-1", "document", 0);
        initial
            .metadata
            .insert("kept".into(), serde_json::Value::String("yes".into()));
        store.insert(initial).await.unwrap();

        let mut patch_meta = Map::new();
        patch_meta.insert("added".into(), serde_json::Value::String("new".into()));
        let found = store
            .update(
                "m-1",
                MetadataPatch {
                    importance: Some(4),
                    metadata: Some(patch_meta),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(found);

        let updated = store.get("m-1").await.unwrap().unwrap();
        assert_eq!(updated.importance, 4);
        assert_eq!(updated.metadata.get("kept").unwrap(), "yes");
        assert_eq!(updated.metadata.get("added").unwrap(), "new");
    }

    #[tokio::test]
    async fn update_missing_record_reports_not_found() {
        let store = InMemoryMetadataStore::new();
        let found = store
            .update(
                "ghost",
                MetadataPatch {
                    importance: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!found);
    }

    #[tokio::test]
    async fn list_is_newest_first_with_pagination() {
        let store = InMemoryMetadataStore::new();
        store.insert(record("old", "document", 48)).await.unwrap();
        store.insert(record("newer", "document", 24)).await.unwrap();
        store.insert(record("newest", "document", 0)).await.unwrap();

        let all = store
            .list(&MemoryFilter::default(), 10, 0)
            .await
            .unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "newer", "old"]);

        let page = store.list(&MemoryFilter::default(), 1, 1).await.unwrap();
        assert_eq!(page[0].id, "newer");
    }

    #[tokio::test]
    async fn list_applies_category_filter() {
        let store = InMemoryMetadataStore::new();
        store.insert(record("d-1", "document", 0)).await.unwrap();
        store.insert(record("w-1", "web", 0)).await.unwrap();

        let docs = store
            .list(&MemoryFilter::category("document"), 10, 0)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "d-1");
    }

    #[tokio::test]
    async fn count_by_category_aggregates() {
        let store = InMemoryMetadataStore::new();
        store.insert(record("d-1", "document", 0)).await.unwrap();
        store.insert(record("d-2", "document", 1)).await.unwrap();
        store.insert(record("w-1", "web", 0)).await.unwrap();

        let counts = store.count_by_category().await.unwrap();
        assert_eq!(counts.get("document"), Some(&2));
        assert_eq!(counts.get("web"), Some(&1));
        assert_eq!(counts.get("important"), None);
    }

    #[tokio::test]
    async fn backup_and_restore_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");

        let store = InMemoryMetadataStore::new();
        store.insert(record("m-1", "document", 0)).await.unwrap();
        store.insert(record("m-2", "web", 2)).await.unwrap();
        store.backup(&path).await.unwrap();

        let restored = InMemoryMetadataStore::new();
        restored.restore(&path).await.unwrap();
        assert_eq!(restored.len().await, 2);
        let fetched = restored.get("m-2").await.unwrap().unwrap();
        assert_eq!(fetched.category, "web");
    }
}
