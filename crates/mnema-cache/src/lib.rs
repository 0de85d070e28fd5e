// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search result caching for the Mnema memory engine.
//!
//! Sits in front of external search providers: deterministic content-
//! addressed keys, TTL expiry with eager purge-on-read, selective
//! invalidation by query and/or provider, and periodic sweeping.

pub mod cache;

pub use cache::{CacheStats, SearchCache, SearchParams, cache_key};
