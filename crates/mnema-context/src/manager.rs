// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation context windows with merge/dedup/eviction.
//!
//! Each conversation id owns a bounded, ordered window of memory items,
//! held in memory for the process lifetime until explicitly cleared.
//! Same-conversation calls serialize on a per-key mutex so the
//! merge-then-truncate invariant holds; different conversations never
//! block each other.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use metrics::gauge;
use tokio::sync::Mutex;
use tracing::debug;

use mnema_config::model::ContextConfig;
use mnema_memory::retriever::MemoryRetriever;
use mnema_memory::types::MemoryItem;

/// Conversation-scoped items carry this provenance type.
pub const CONVERSATION_SOURCE_TYPE: &str = "conversation";

type Window = Arc<Mutex<Vec<MemoryItem>>>;

/// Manages one sliding memory window per conversation.
pub struct ContextManager {
    retriever: Arc<MemoryRetriever>,
    config: ContextConfig,
    windows: DashMap<String, Window>,
}

impl ContextManager {
    pub fn new(retriever: Arc<MemoryRetriever>, config: ContextConfig) -> Self {
        Self {
            retriever,
            config,
            windows: DashMap::new(),
        }
    }

    /// Returns the rendered context for a conversation, refreshed against
    /// the query.
    ///
    /// Lazily creates an empty window on first access, retrieves up to
    /// `window_size` conversation-scoped items, merges them into the window
    /// (existing items keep their order and win id collisions), truncates,
    /// stores the updated window, and renders it. Retrieval is best-effort:
    /// on a degraded read the existing window is re-rendered unchanged.
    pub async fn get_context(&self, conversation_id: &str, query: &str) -> String {
        let window = self.window(conversation_id);
        let mut guard = window.lock().await;

        let fresh = self
            .retriever
            .retrieve_by_source(
                CONVERSATION_SOURCE_TYPE,
                conversation_id,
                Some(query),
                self.config.window_size,
                0,
            )
            .await;
        *guard = merge_windows(&guard, fresh, self.config.window_size);
        debug!(
            conversation_id,
            window_len = guard.len(),
            "conversation context refreshed"
        );
        self.retriever.format_context_for_llm(&guard, None, None)
    }

    /// Merges externally supplied items into a conversation's window
    /// without a retrieval call.
    pub async fn update_context(&self, conversation_id: &str, items: Vec<MemoryItem>) {
        let window = self.window(conversation_id);
        let mut guard = window.lock().await;
        *guard = merge_windows(&guard, items, self.config.window_size);
    }

    /// Drops a conversation's window. Returns `false` when none existed.
    pub fn clear_context(&self, conversation_id: &str) -> bool {
        let removed = self.windows.remove(conversation_id).is_some();
        gauge!("mnema_context_windows_active").set(self.windows.len() as f64);
        removed
    }

    /// The current window contents, or `None` for an unseen conversation.
    pub async fn window_items(&self, conversation_id: &str) -> Option<Vec<MemoryItem>> {
        let window = self.windows.get(conversation_id)?.value().clone();
        let guard = window.lock().await;
        Some(guard.clone())
    }

    /// Number of conversations currently holding a window.
    pub fn active_conversations(&self) -> usize {
        self.windows.len()
    }

    /// Fetches (or lazily creates) the per-conversation window handle.
    ///
    /// The DashMap guard is dropped before any await so a stalled
    /// conversation never blocks the whole map.
    fn window(&self, conversation_id: &str) -> Window {
        let window = self
            .windows
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .value()
            .clone();
        gauge!("mnema_context_windows_active").set(self.windows.len() as f64);
        window
    }
}

/// The window merge rule.
///
/// Existing items keep their current order; incoming items are appended
/// only when their id is not already present (first seen wins); the result
/// is truncated to `window_size`. A full window therefore silently drops
/// fresh items -- conversational stability is deliberately favored over
/// freshness, so do not replace this with rank-then-truncate.
pub fn merge_windows(
    existing: &[MemoryItem],
    incoming: Vec<MemoryItem>,
    window_size: usize,
) -> Vec<MemoryItem> {
    let mut merged: Vec<MemoryItem> = existing.to_vec();
    let mut seen: HashSet<String> = merged.iter().map(|item| item.id.clone()).collect();
    for item in incoming {
        if seen.insert(item.id.clone()) {
            merged.push(item);
        }
    }
    merged.truncate(window_size);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Map;

    fn item(id: &str) -> MemoryItem {
        MemoryItem {
            id: id.to_string(),
            content: format!("content of {id}"),
            category: "conversation".into(),
            source_type: Some(CONVERSATION_SOURCE_TYPE.into()),
            source_id: Some("chat-1".into()),
            importance: 1,
            metadata: Map::new(),
            created_at: Utc::now(),
            embedding: None,
            relevance: None,
        }
    }

    fn ids(items: &[MemoryItem]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn merge_dedups_preserves_order_and_truncates() {
        let existing = vec![item("A"), item("B")];
        let incoming = vec![item("B"), item("C"), item("D")];

        let merged = merge_windows(&existing, incoming, 3);
        assert_eq!(ids(&merged), vec!["A", "B", "C"], "duplicate B not re-added, D dropped");
    }

    #[test]
    fn merge_into_empty_window() {
        let merged = merge_windows(&[], vec![item("X"), item("Y")], 5);
        assert_eq!(ids(&merged), vec!["X", "Y"]);
    }

    #[test]
    fn full_window_drops_all_incoming() {
        let existing = vec![item("A"), item("B"), item("C")];
        let merged = merge_windows(&existing, vec![item("D"), item("E")], 3);
        assert_eq!(ids(&merged), vec!["A", "B", "C"]);
    }

    #[test]
    fn merge_never_duplicates_ids() {
        let existing = vec![item("A"), item("B")];
        let merged = merge_windows(&existing, vec![item("A"), item("B"), item("A")], 10);
        assert_eq!(ids(&merged), vec!["A", "B"]);
    }
}
