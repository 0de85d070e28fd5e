// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding providers for tests.
//!
//! [`HashEmbedder`] derives an L2-normalized vector from seeded hashes of
//! the input text: identical texts embed identically (cosine similarity
//! 1.0), different texts diverge. Good enough to exercise every ranking
//! path without a model. [`FailingEmbedder`] errors on every call for
//! failure-path tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use mnema_core::error::MnemaError;
use mnema_core::traits::{EmbeddingAdapter, PluginAdapter};
use mnema_core::types::{AdapterType, HealthStatus};

/// Hash-based deterministic embedding provider.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for (i, slot) in vector.iter_mut().enumerate() {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let hash = hasher.finish();
            *slot = ((hash as f32) / (u64::MAX as f32)) * 2.0 - 1.0;
        }
        // L2-normalize so cosine similarity of identical texts is exactly 1.
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for slot in &mut vector {
                *slot /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl PluginAdapter for HashEmbedder {
    fn name(&self) -> &str {
        "hash-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemaError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MnemaError> {
        Ok(self.hash_embed(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MnemaError> {
        Ok(texts.iter().map(|text| self.hash_embed(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "hash-embedder"
    }
}

/// Embedding provider that fails every call.
#[derive(Default)]
pub struct FailingEmbedder;

impl FailingEmbedder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for FailingEmbedder {
    fn name(&self) -> &str {
        "failing-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemaError> {
        Ok(HealthStatus::Unhealthy("always fails".into()))
    }

    async fn shutdown(&self) -> Result<(), MnemaError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, MnemaError> {
        Err(MnemaError::embedding("provider unavailable"))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, MnemaError> {
        Err(MnemaError::embedding("provider unavailable"))
    }

    fn dimensions(&self) -> usize {
        0
    }

    fn model_id(&self) -> &str {
        "failing-embedder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnema_core::types::cosine_similarity;

    #[tokio::test]
    async fn identical_texts_embed_identically() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("hello world").await.unwrap();
        assert_eq!(a.len(), 128);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn different_texts_diverge() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("entirely different").await.unwrap();
        assert!(cosine_similarity(&a, &b) < 1.0);
    }

    #[tokio::test]
    async fn vectors_are_normalized() {
        let embedder = HashEmbedder::new(64);
        let v = embedder.embed("normalize me").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn batch_matches_single_calls() {
        let embedder = HashEmbedder::new(32);
        let batch = embedder
            .embed_batch(&["one".into(), "two".into()])
            .await
            .unwrap();
        let single = embedder.embed("one").await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], single);
    }

    #[tokio::test]
    async fn failing_embedder_fails() {
        let embedder = FailingEmbedder::new();
        assert!(embedder.embed("anything").await.is_err());
        assert!(embedder.embed_batch(&["x".into()]).await.is_err());
    }
}
