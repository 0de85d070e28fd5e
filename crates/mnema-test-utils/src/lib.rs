// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mnema integration tests.
//!
//! Deterministic mock adapters: a hash-based embedding provider for
//! exercising the full retrieval pipeline without a model, and failing
//! adapters for dual-write and degradation paths.

pub mod mock_embedder;
pub mod mock_stores;

pub use mock_embedder::{FailingEmbedder, HashEmbedder};
pub use mock_stores::FailingMetadataStore;
