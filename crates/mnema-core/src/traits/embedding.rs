// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::MnemaError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for generating vector embeddings from text.
///
/// Embedding adapters power semantic search and memory retrieval by
/// converting content into vector representations. For a given
/// [`model_id`](EmbeddingAdapter::model_id), `dimensions` must be identical
/// across calls; the engine stamps the model id into stored vector metadata
/// so mixed-model indexes stay diagnosable.
#[async_trait]
pub trait EmbeddingAdapter: PluginAdapter {
    /// Generates an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MnemaError>;

    /// Generates embeddings for a batch of texts in one provider round trip.
    ///
    /// The output has the same length and order as the input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MnemaError>;

    /// The dimensionality of every vector this adapter produces.
    fn dimensions(&self) -> usize;

    /// Identifier of the underlying embedding model.
    fn model_id(&self) -> &str;
}
