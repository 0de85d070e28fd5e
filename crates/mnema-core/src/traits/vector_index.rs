// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector index adapter trait for nearest-neighbor storage backends.

use std::path::Path;

use async_trait::async_trait;

use crate::error::MnemaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MemoryFilter, VectorHit, VectorRecord};

/// Adapter for the physical vector index.
///
/// Persists `(id, vector, text, metadata)` tuples and answers
/// nearest-neighbor queries with an optional metadata filter. All effects
/// are visible as soon as a call returns; there is no deferred consistency
/// window for callers to reason about.
#[async_trait]
pub trait VectorIndexAdapter: PluginAdapter {
    /// Inserts or replaces a record by id.
    async fn upsert(&self, record: VectorRecord) -> Result<(), MnemaError>;

    /// Inserts or replaces a batch of records in one backend round trip.
    async fn upsert_batch(&self, records: Vec<VectorRecord>) -> Result<(), MnemaError>;

    /// Deletes a record. Idempotent; returns whether a record existed.
    async fn delete(&self, id: &str) -> Result<bool, MnemaError>;

    /// Fetches a record by id.
    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, MnemaError>;

    /// Nearest-neighbor search, most similar first, scores in [0, 1].
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        filter: &MemoryFilter,
    ) -> Result<Vec<VectorHit>, MnemaError>;

    /// Counts records matching the filter.
    async fn count(&self, filter: &MemoryFilter) -> Result<u64, MnemaError>;

    /// Writes a snapshot of the index to `path`.
    async fn backup(&self, path: &Path) -> Result<(), MnemaError>;

    /// Replaces the index contents from a snapshot at `path`.
    async fn restore(&self, path: &Path) -> Result<(), MnemaError>;

    /// Backend-specific housekeeping (compaction, reindexing).
    async fn optimize(&self) -> Result<(), MnemaError>;
}
