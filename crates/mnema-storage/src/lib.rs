// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process reference backends for the Mnema memory engine.
//!
//! Implements the [`VectorIndexAdapter`] and [`MetadataStoreAdapter`] traits
//! from `mnema-core` with in-memory structures: exact brute-force vector
//! search and a filtered record map. Suitable for ephemeral deployments and
//! as the backend every integration test runs against; durable backends
//! (a hosted vector index, a relational store) plug in behind the same
//! traits.
//!
//! [`VectorIndexAdapter`]: mnema_core::traits::VectorIndexAdapter
//! [`MetadataStoreAdapter`]: mnema_core::traits::MetadataStoreAdapter

pub mod index;
pub mod metadata;

pub use index::InMemoryVectorIndex;
pub use metadata::InMemoryMetadataStore;
