// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failing store adapters for exercising dual-write failure paths.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use mnema_core::error::MnemaError;
use mnema_core::traits::{MetadataStoreAdapter, PluginAdapter};
use mnema_core::types::{
    AdapterType, HealthStatus, MemoryFilter, MemoryRecord, MetadataPatch,
};

fn unavailable() -> MnemaError {
    MnemaError::Store {
        source: Box::new(std::io::Error::other("metadata store unavailable")),
    }
}

/// Metadata store whose every operation fails with a `Store` error.
///
/// Lets tests assert that a vector write followed by a metadata failure is
/// surfaced to the caller instead of silently succeeding half-written.
#[derive(Default)]
pub struct FailingMetadataStore;

impl FailingMetadataStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for FailingMetadataStore {
    fn name(&self) -> &str {
        "failing-metadata-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MetadataStore
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemaError> {
        Ok(HealthStatus::Unhealthy("always fails".into()))
    }

    async fn shutdown(&self) -> Result<(), MnemaError> {
        Ok(())
    }
}

#[async_trait]
impl MetadataStoreAdapter for FailingMetadataStore {
    async fn insert(&self, _record: MemoryRecord) -> Result<(), MnemaError> {
        Err(unavailable())
    }

    async fn insert_batch(&self, _records: Vec<MemoryRecord>) -> Result<(), MnemaError> {
        Err(unavailable())
    }

    async fn get(&self, _id: &str) -> Result<Option<MemoryRecord>, MnemaError> {
        Err(unavailable())
    }

    async fn update(&self, _id: &str, _patch: MetadataPatch) -> Result<bool, MnemaError> {
        Err(unavailable())
    }

    async fn delete(&self, _id: &str) -> Result<bool, MnemaError> {
        Err(unavailable())
    }

    async fn list(
        &self,
        _filter: &MemoryFilter,
        _limit: usize,
        _offset: usize,
    ) -> Result<Vec<MemoryRecord>, MnemaError> {
        Err(unavailable())
    }

    async fn count(&self, _filter: &MemoryFilter) -> Result<u64, MnemaError> {
        Err(unavailable())
    }

    async fn count_by_category(&self) -> Result<HashMap<String, u64>, MnemaError> {
        Err(unavailable())
    }

    async fn backup(&self, _path: &Path) -> Result<(), MnemaError> {
        Err(unavailable())
    }

    async fn restore(&self, _path: &Path) -> Result<(), MnemaError> {
        Err(unavailable())
    }

    async fn optimize(&self) -> Result<(), MnemaError> {
        Err(unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_operation_fails() {
        let store = FailingMetadataStore::new();
        assert!(store.get("any").await.is_err());
        assert!(store.count(&MemoryFilter::default()).await.is_err());
        assert!(store.count_by_category().await.is_err());
    }
}
