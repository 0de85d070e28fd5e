// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metadata store adapter trait for the structured half of the dual store.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::MnemaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MemoryFilter, MemoryRecord, MetadataPatch};

/// Adapter for the structured memory-record store.
///
/// Listing order is newest-first by `created_at`; `offset`/`limit` paginate
/// within that order.
#[async_trait]
pub trait MetadataStoreAdapter: PluginAdapter {
    /// Inserts or replaces a record by id.
    async fn insert(&self, record: MemoryRecord) -> Result<(), MnemaError>;

    /// Inserts or replaces a batch of records in one backend round trip.
    async fn insert_batch(&self, records: Vec<MemoryRecord>) -> Result<(), MnemaError>;

    /// Fetches a record by id.
    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, MnemaError>;

    /// Applies a patch to a record. Returns whether the record was found.
    async fn update(&self, id: &str, patch: MetadataPatch) -> Result<bool, MnemaError>;

    /// Deletes a record. Idempotent; returns whether a record existed.
    async fn delete(&self, id: &str) -> Result<bool, MnemaError>;

    /// Filtered listing, newest first.
    async fn list(
        &self,
        filter: &MemoryFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MemoryRecord>, MnemaError>;

    /// Counts records matching the filter.
    async fn count(&self, filter: &MemoryFilter) -> Result<u64, MnemaError>;

    /// Record counts aggregated by category.
    async fn count_by_category(&self) -> Result<HashMap<String, u64>, MnemaError>;

    /// Writes a snapshot of the store to `path`.
    async fn backup(&self, path: &Path) -> Result<(), MnemaError>;

    /// Replaces the store contents from a snapshot at `path`.
    async fn restore(&self, path: &Path) -> Result<(), MnemaError>;

    /// Backend-specific housekeeping (vacuum, analyze).
    async fn optimize(&self) -> Result<(), MnemaError>;
}
