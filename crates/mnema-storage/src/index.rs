// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory vector index with brute-force cosine search.
//!
//! The reference backend for [`VectorIndexAdapter`]: every search scans all
//! stored vectors, which is exact and fast enough for personal-scale memory
//! sets. Records whose dimensionality does not match the query are skipped
//! rather than erroring.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use mnema_core::error::MnemaError;
use mnema_core::traits::{PluginAdapter, VectorIndexAdapter};
use mnema_core::types::{
    AdapterType, HealthStatus, MemoryFilter, VectorHit, VectorRecord, cosine_similarity,
};

/// In-memory [`VectorIndexAdapter`] implementation.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl InMemoryVectorIndex {
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
impl PluginAdapter for InMemoryVectorIndex {
    fn name(&self) -> &str {
        "in-memory-vector-index"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::VectorIndex
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemaError> {
        Ok(())
    }
}

#[async_trait]
impl VectorIndexAdapter for InMemoryVectorIndex {
    async fn upsert(&self, record: VectorRecord) -> Result<(), MnemaError> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn upsert_batch(&self, records: Vec<VectorRecord>) -> Result<(), MnemaError> {
        let mut guard = self.records.write().await;
        for record in records {
            guard.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, MnemaError> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, MnemaError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        filter: &MemoryFilter,
    ) -> Result<Vec<VectorHit>, MnemaError> {
        let guard = self.records.read().await;
        let mut hits: Vec<VectorHit> = guard
            .values()
            .filter(|record| record.vector.len() == vector.len())
            .filter(|record| filter.matches_metadata(&record.metadata))
            .map(|record| VectorHit {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.vector).clamp(0.0, 1.0),
                text: record.text.clone(),
                metadata: record.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self, filter: &MemoryFilter) -> Result<u64, MnemaError> {
        let guard = self.records.read().await;
        Ok(guard
            .values()
            .filter(|record| filter.matches_metadata(&record.metadata))
            .count() as u64)
    }

    async fn backup(&self, path: &Path) -> Result<(), MnemaError> {
        let records: Vec<VectorRecord> = self.records.read().await.values().cloned().collect();
        let bytes = serde_json::to_vec(&records).map_err(json_err)?;
        tokio::fs::write(path, bytes).await.map_err(io_err)?;
        debug!(path = %path.display(), count = records.len(), "vector index snapshot written");
        Ok(())
    }

    async fn restore(&self, path: &Path) -> Result<(), MnemaError> {
        let bytes = tokio::fs::read(path).await.map_err(io_err)?;
        let records: Vec<VectorRecord> = serde_json::from_slice(&bytes).map_err(json_err)?;
        let mut guard = self.records.write().await;
        guard.clear();
        for record in records {
            guard.insert(record.id.clone(), record);
        }
        debug!(path = %path.display(), count = guard.len(), "vector index snapshot restored");
        Ok(())
    }

    async fn optimize(&self) -> Result<(), MnemaError> {
        self.records.write().await.shrink_to_fit();
        Ok(())
    }
}
