// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the external collaborators the memory engine consumes.

pub mod adapter;
pub mod embedding;
pub mod metadata;
pub mod vector_index;

pub use adapter::PluginAdapter;
pub use embedding::EmbeddingAdapter;
pub use metadata::MetadataStoreAdapter;
pub use vector_index::VectorIndexAdapter;
