// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Mnema memory engine.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the plugin registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    VectorIndex,
    MetadataStore,
}

/// Rendering style for LLM context strings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContextFormat {
    /// Full per-item rendering with category, provenance, and timestamp.
    #[default]
    Detailed,
    /// Content-only bullet lines.
    Compact,
}

// --- Vector index types ---

/// A record persisted in the vector index: the embedding plus the text it
/// was derived from and the filterable metadata attached at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// A single nearest-neighbor hit, with similarity already normalized to [0, 1].
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub metadata: Map<String, Value>,
}

// --- Metadata store types ---

/// The structured half of a memory item, persisted in the metadata store.
///
/// The text payload and the embedding live in the vector index; this record
/// carries everything used for filtered listing, counting, and ranking inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub category: String,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    /// Ranking input, 1..=5.
    pub importance: u8,
    pub metadata: Map<String, Value>,
    /// Set once at creation, never mutated. Recency input.
    pub created_at: DateTime<Utc>,
}

/// A partial update applied to a [`MemoryRecord`].
///
/// `metadata` merges key-by-key into the stored map; all other fields
/// replace when present. `created_at` is deliberately not patchable.
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub category: Option<String>,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    pub importance: Option<u8>,
    pub metadata: Option<Map<String, Value>>,
}

impl MetadataPatch {
    /// True when the patch carries no changes.
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.source_type.is_none()
            && self.source_id.is_none()
            && self.importance.is_none()
            && self.metadata.is_none()
    }
}

/// Filter applied to memory reads and vector searches.
///
/// All present fields must match (conjunction). The vector index matches the
/// same fields against the reserved keys stamped into record metadata, so a
/// filter behaves identically on both sides of the dual store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFilter {
    pub category: Option<String>,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
}

impl MemoryFilter {
    /// Filter on a single category.
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Filter on a provenance pointer.
    pub fn source(source_type: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            source_type: Some(source_type.into()),
            source_id: Some(source_id.into()),
            ..Self::default()
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.source_type.is_none() && self.source_id.is_none()
    }

    /// Matches this filter against a metadata record.
    pub fn matches_record(&self, record: &MemoryRecord) -> bool {
        if let Some(cat) = &self.category
            && record.category != *cat
        {
            return false;
        }
        if let Some(st) = &self.source_type
            && record.source_type.as_deref() != Some(st.as_str())
        {
            return false;
        }
        if let Some(sid) = &self.source_id
            && record.source_id.as_deref() != Some(sid.as_str())
        {
            return false;
        }
        true
    }

    /// Matches this filter against the reserved keys in vector-record metadata.
    pub fn matches_metadata(&self, metadata: &Map<String, Value>) -> bool {
        let field_matches = |key: &str, expected: &str| {
            metadata.get(key).and_then(Value::as_str) == Some(expected)
        };
        if let Some(cat) = &self.category
            && !field_matches("category", cat)
        {
            return false;
        }
        if let Some(st) = &self.source_type
            && !field_matches("source_type", st)
        {
            return false;
        }
        if let Some(sid) = &self.source_id
            && !field_matches("source_id", sid)
        {
            return false;
        }
        true
    }
}

// --- Category validation ---

/// The default category names accepted by [`CategorySet::default`].
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "conversation",
    "document",
    "web",
    "important",
    "user_defined",
    "search",
];

/// The set of category names accepted on every memory write.
///
/// Deployment-configurable, but the same instance must back validation on
/// both sides of the dual store: it is constructed once from configuration
/// and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    names: BTreeSet<String>,
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().map(|s| s.to_string()))
    }
}

impl CategorySet {
    /// Builds a set from the given names.
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// True when `category` belongs to the set.
    pub fn contains(&self, category: &str) -> bool {
        self.names.contains(category)
    }

    /// Validates `category`, returning a [`MnemaError::Validation`] naming
    /// the offending value otherwise.
    pub fn validate(&self, category: &str) -> Result<(), crate::error::MnemaError> {
        if self.contains(category) {
            Ok(())
        } else {
            Err(crate::error::MnemaError::validation(
                "category",
                format!("unknown category `{category}`"),
            ))
        }
    }

    /// Iterates the accepted names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-norm inputs rather than
/// erroring: a degenerate vector simply cannot match anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
