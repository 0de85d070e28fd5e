// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnema memory engine.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Mnema workspace. The backends in
//! `mnema-storage` and the pipeline in `mnema-memory` are built against the
//! traits defined here.

pub mod error;
pub mod tokens;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemaError;
pub use types::{
    AdapterType, CategorySet, ContextFormat, HealthStatus, MemoryFilter, MemoryRecord,
    MetadataPatch, VectorHit, VectorRecord,
};

// Re-export all adapter traits at crate root.
pub use traits::{EmbeddingAdapter, MetadataStoreAdapter, PluginAdapter, VectorIndexAdapter};
