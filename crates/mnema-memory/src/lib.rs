// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dual-store memory pipeline for the Mnema memory engine.
//!
//! ## Architecture
//!
//! - **VectorStore**: text-oriented adapter over the embedding provider and
//!   the vector index
//! - **MemoryStorage**: the sole writer of both stores; composes full items
//!   on reads and keeps the dual write observable on failures
//! - **scoring**: recency decay and similarity/recency/importance fusion
//! - **MemoryRetriever**: ranked retrieval and token-bounded context
//!   rendering with best-effort read paths
//!
//! Backends plug in behind the `mnema-core` adapter traits; `mnema-storage`
//! ships in-memory reference implementations.

pub mod retriever;
pub mod scoring;
pub mod storage;
pub mod types;
pub mod vector;

pub use retriever::MemoryRetriever;
pub use storage::MemoryStorage;
pub use types::{MemoryItem, MemoryUpdate, ScoredMemoryItem, StoreMemoryRequest};
pub use vector::VectorStore;
