// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mnema memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use mnema_core::types::{ContextFormat, DEFAULT_CATEGORIES};
use serde::{Deserialize, Serialize};

/// Top-level Mnema configuration.
///
/// Loaded from TOML files with environment variable overrides. All sections
/// are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemaConfig {
    /// Memory write-path settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Retrieval ranking settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Conversation context window settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// Search result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Memory write-path configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Category names accepted on every memory write. Must match the set
    /// the metadata store validates against.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

/// Retrieval ranking configuration.
///
/// The three weights fuse similarity, recency, and normalized importance
/// into one ordering score. They conceptually sum to 1.0 but the sum is
/// deliberately not enforced; the combined score is clamped to [0, 1]
/// instead, and downstream ranking depends on the exact defaults below.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Weight applied to query similarity.
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f32,

    /// Weight applied to the recency decay score.
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f32,

    /// Weight applied to normalized importance (importance / 5).
    #[serde(default = "default_importance_weight")]
    pub importance_weight: f32,

    /// Default number of items returned by retrieval operations.
    #[serde(default = "default_retrieval_limit")]
    pub default_limit: usize,

    /// Token budget for formatted LLM context strings.
    #[serde(default = "default_context_token_limit")]
    pub context_token_limit: usize,

    /// Rendering style for formatted context.
    #[serde(default)]
    pub context_format: ContextFormat,

    /// Seconds a single retrieval operation may spend against the backing
    /// stores before it counts as a retrieval failure.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_weight: default_similarity_weight(),
            recency_weight: default_recency_weight(),
            importance_weight: default_importance_weight(),
            default_limit: default_retrieval_limit(),
            context_token_limit: default_context_token_limit(),
            context_format: ContextFormat::default(),
            operation_timeout_secs: default_operation_timeout_secs(),
        }
    }
}

fn default_similarity_weight() -> f32 {
    0.65
}

fn default_recency_weight() -> f32 {
    0.25
}

fn default_importance_weight() -> f32 {
    0.10
}

fn default_retrieval_limit() -> usize {
    10
}

fn default_context_token_limit() -> usize {
    2000
}

fn default_operation_timeout_secs() -> u64 {
    30
}

/// Conversation context window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Maximum items held in one conversation window.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

fn default_window_size() -> usize {
    10
}

/// Search result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Seconds an entry stays valid after its write.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum entries held before the oldest is evicted.
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            max_entries: default_cache_max_entries(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_cache_max_entries() -> usize {
    1024
}
