// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types: the composed memory item and write-path requests.

use chrono::{DateTime, Utc};
use mnema_core::types::{MemoryRecord, MetadataPatch, VectorRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single memory item, composed from both halves of the dual store.
///
/// The text payload and embedding come from the vector index; category,
/// provenance, importance, and timestamps come from the metadata store.
/// An item only exists when both halves are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique identifier, immutable after creation.
    pub id: String,
    /// The text payload retrieved and shown to the LLM.
    pub content: String,
    /// One of the configured category names.
    pub category: String,
    /// Optional provenance pointer, e.g. ("document", document id).
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    /// Ranking input, 1..=5.
    pub importance: u8,
    /// Open key/value map.
    pub metadata: Map<String, Value>,
    /// Set once at creation; recency input.
    pub created_at: DateTime<Utc>,
    /// The stored embedding, when the read path carried it along.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
    /// Query similarity attached by search reads. Transient, not persisted.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relevance: Option<f32>,
}

impl MemoryItem {
    /// Composes an item from its two stored halves.
    pub fn compose(record: MemoryRecord, vector: VectorRecord) -> Self {
        Self {
            id: record.id,
            content: vector.text,
            category: record.category,
            source_type: record.source_type,
            source_id: record.source_id,
            importance: record.importance,
            metadata: record.metadata,
            created_at: record.created_at,
            embedding: Some(vector.vector),
            relevance: None,
        }
    }

    /// Returns a copy with the given search relevance attached.
    pub fn with_relevance(mut self, relevance: f32) -> Self {
        self.relevance = Some(relevance);
        self
    }
}

/// A memory item annotated with its transient ranking scores.
///
/// Scores exist only for ordering within one retrieval call and are never
/// persisted.
#[derive(Debug, Clone)]
pub struct ScoredMemoryItem {
    pub item: MemoryItem,
    /// Query similarity in [0, 1].
    pub similarity_score: f32,
    /// Time-decay score in (0, 1].
    pub recency_score: f32,
    /// Weighted fusion in [0, 1], the ordering key.
    pub combined_score: f32,
}

/// Request to store one memory item.
#[derive(Debug, Clone)]
pub struct StoreMemoryRequest {
    pub content: String,
    pub category: String,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    /// Defaults to 1 when absent.
    pub importance: Option<u8>,
    pub metadata: Option<Map<String, Value>>,
    /// Caller-supplied id; generated when absent.
    pub id: Option<String>,
}

impl StoreMemoryRequest {
    pub fn new(content: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            category: category.into(),
            source_type: None,
            source_id: None,
            importance: None,
            metadata: None,
            id: None,
        }
    }

    pub fn with_source(
        mut self,
        source_type: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        self.source_type = Some(source_type.into());
        self.source_id = Some(source_id.into());
        self
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Partial update applied to an existing memory item.
///
/// A `content` change regenerates the embedding; every other field is a
/// metadata-store change. `created_at` is immutable and has no field here.
#[derive(Debug, Clone, Default)]
pub struct MemoryUpdate {
    pub content: Option<String>,
    pub category: Option<String>,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    pub importance: Option<u8>,
    pub metadata: Option<Map<String, Value>>,
}

impl MemoryUpdate {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.metadata_patch().is_empty()
    }

    /// The metadata-store half of this update.
    pub fn metadata_patch(&self) -> MetadataPatch {
        MetadataPatch {
            category: self.category.clone(),
            source_type: self.source_type.clone(),
            source_id: self.source_id.clone(),
            importance: self.importance,
            metadata: self.metadata.clone(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> MemoryRecord {
        MemoryRecord {
            id: "m-1".into(),
            category: "document".into(),
            source_type: Some("document".into()),
            source_id: Some("d-9".into()),
            importance: 3,
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    fn sample_vector() -> VectorRecord {
        VectorRecord {
            id: "m-1".into(),
            vector: vec![0.1, 0.2],
            text: "the quarterly report".into(),
            metadata: Map::new(),
        }
    }

    #[test]
    fn compose_joins_both_halves() {
        let item = MemoryItem::compose(sample_record(), sample_vector());
        assert_eq!(item.id, "m-1");
        assert_eq!(item.content, "the quarterly report");
        assert_eq!(item.category, "document");
        assert_eq!(item.importance, 3);
        assert_eq!(item.embedding.as_deref(), Some([0.1, 0.2].as_slice()));
        assert!(item.relevance.is_none());
    }

    #[test]
    fn with_relevance_attaches_score() {
        let item = MemoryItem::compose(sample_record(), sample_vector()).with_relevance(0.8);
        assert_eq!(item.relevance, Some(0.8));
    }

    #[test]
    fn store_request_builders() {
        let request = StoreMemoryRequest::new("note", "user_defined")
            .with_source("document", "d-1")
            .with_importance(5)
            .with_id("fixed-id");
        assert_eq!(request.source_type.as_deref(), Some("document"));
        assert_eq!(request.importance, Some(5));
        assert_eq!(request.id.as_deref(), Some("fixed-id"));
    }

    #[test]
    fn update_emptiness_considers_all_fields() {
        assert!(MemoryUpdate::default().is_empty());
        assert!(!MemoryUpdate::default().with_content("x").is_empty());
        assert!(!MemoryUpdate::default().with_importance(2).is_empty());
    }

    #[test]
    fn metadata_patch_excludes_content() {
        let update = MemoryUpdate::default()
            .with_content("new text")
            .with_category("web");
        let patch = update.metadata_patch();
        assert_eq!(patch.category.as_deref(), Some("web"));
        assert!(patch.importance.is_none());
    }

    #[test]
    fn serialization_skips_embedding() {
        let mut item = MemoryItem::compose(sample_record(), sample_vector());
        item.relevance = Some(0.5);
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("embedding").is_none());
        assert_eq!(json.get("relevance").and_then(Value::as_f64), Some(0.5));
    }
}
