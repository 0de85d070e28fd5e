// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ranking engine: fuses similarity, recency, and importance into one
//! ordered result list and renders token-bounded context strings.
//!
//! Every public retrieval operation is best-effort: internal errors are
//! logged, counted, and degrade to an empty result. Retrieval must never
//! abort an in-progress LLM turn, so callers cannot distinguish "no
//! results" from "error" by the return value alone -- the tracing output
//! and the `mnema_retrieval_errors_total` counter are the side channel.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::warn;

use mnema_config::model::RetrievalConfig;
use mnema_core::error::MnemaError;
use mnema_core::tokens::truncate_to_tokens;
use mnema_core::traits::EmbeddingAdapter;
use mnema_core::types::{ContextFormat, MemoryFilter, cosine_similarity};

use crate::scoring::score_item;
use crate::storage::MemoryStorage;
use crate::types::MemoryItem;

/// Ranked retrievals over-fetch candidates by this factor before scoring.
const CANDIDATE_MULTIPLIER: usize = 3;

/// Timestamp rendering used in detailed context lines.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// The memory retriever: candidate search, score fusion, context rendering.
pub struct MemoryRetriever {
    storage: Arc<MemoryStorage>,
    embedder: Arc<dyn EmbeddingAdapter>,
    config: RetrievalConfig,
}

impl MemoryRetriever {
    /// Creates a retriever over the given storage.
    ///
    /// `embedder` must be the same instance the storage writes with, so
    /// query vectors and stored vectors share a model.
    pub fn new(
        storage: Arc<MemoryStorage>,
        embedder: Arc<dyn EmbeddingAdapter>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            storage,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieves the most relevant items for a query.
    ///
    /// Over-fetches candidates via content search, fuses
    /// similarity/recency/importance per candidate, sorts by combined score
    /// descending (stable: ties keep vector-relevance order), truncates.
    pub async fn retrieve_context(
        &self,
        query: &str,
        filter: &MemoryFilter,
        limit: usize,
    ) -> Vec<MemoryItem> {
        degrade(
            "retrieve_context",
            self.bounded(self.try_retrieve_context(query, filter, limit))
                .await,
        )
    }

    async fn try_retrieve_context(
        &self,
        query: &str,
        filter: &MemoryFilter,
        limit: usize,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        let candidates = self
            .storage
            .search_by_content(query, filter, limit * CANDIDATE_MULTIPLIER)
            .await?;
        Ok(self.rank_candidates(candidates, limit))
    }

    /// Same pipeline seeded by a raw vector instead of query text.
    pub async fn retrieve_by_vector(
        &self,
        vector: &[f32],
        filter: &MemoryFilter,
        limit: usize,
    ) -> Vec<MemoryItem> {
        let result = self
            .bounded(async {
                let candidates = self
                    .storage
                    .search_by_vector(vector, filter, limit * CANDIDATE_MULTIPLIER)
                    .await?;
                Ok(self.rank_candidates(candidates, limit))
            })
            .await;
        degrade("retrieve_by_vector", result)
    }

    /// Category-scoped retrieval.
    ///
    /// With a query the category is searched and re-ranked; without one this
    /// is a plain newest-first listing (unranked, `offset` applies).
    pub async fn retrieve_by_category(
        &self,
        category: &str,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Vec<MemoryItem> {
        self.retrieve_filtered(
            "retrieve_by_category",
            MemoryFilter::category(category),
            query,
            limit,
            offset,
        )
        .await
    }

    /// Provenance-scoped retrieval, same shape as category retrieval.
    pub async fn retrieve_by_source(
        &self,
        source_type: &str,
        source_id: &str,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Vec<MemoryItem> {
        self.retrieve_filtered(
            "retrieve_by_source",
            MemoryFilter::source(source_type, source_id),
            query,
            limit,
            offset,
        )
        .await
    }

    async fn retrieve_filtered(
        &self,
        op: &'static str,
        filter: MemoryFilter,
        query: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Vec<MemoryItem> {
        let result = self
            .bounded(async {
                match query {
                    Some(query) => {
                        let candidates = self
                            .storage
                            .search_by_content(query, &filter, limit * CANDIDATE_MULTIPLIER)
                            .await?;
                        let mut ranked = self.try_rank_results(candidates, Some(query)).await?;
                        ranked.truncate(limit);
                        Ok(ranked)
                    }
                    None => self.storage.search_by_metadata(&filter, limit, offset).await,
                }
            })
            .await;
        degrade(op, result)
    }

    /// General-purpose re-ranker.
    ///
    /// With a query, embeds it once and scores similarity against each
    /// item's stored embedding (items lacking one score 0). Recency and
    /// importance are always recomputed. Does not truncate.
    pub async fn rank_results(
        &self,
        items: Vec<MemoryItem>,
        query: Option<&str>,
    ) -> Vec<MemoryItem> {
        degrade(
            "rank_results",
            self.bounded(self.try_rank_results(items, query)).await,
        )
    }

    /// Bounds a retrieval operation by the configured timeout. No store
    /// call may block a turn indefinitely; an elapsed deadline is an
    /// ordinary retrieval failure.
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, MnemaError>>,
    ) -> Result<T, MnemaError> {
        let duration = Duration::from_secs(self.config.operation_timeout_secs);
        match tokio::time::timeout(duration, operation).await {
            Ok(result) => result,
            Err(_) => Err(MnemaError::Timeout { duration }),
        }
    }

    async fn try_rank_results(
        &self,
        items: Vec<MemoryItem>,
        query: Option<&str>,
    ) -> Result<Vec<MemoryItem>, MnemaError> {
        let query_vector = match query {
            Some(query) => Some(self.embedder.embed(query).await?),
            None => None,
        };
        let now = Utc::now();
        let mut scored: Vec<_> = items
            .into_iter()
            .map(|item| {
                let similarity = match (&query_vector, &item.embedding) {
                    (Some(query_vector), Some(embedding)) => {
                        cosine_similarity(query_vector, embedding).clamp(0.0, 1.0)
                    }
                    _ => 0.0,
                };
                score_item(item, similarity, now, &self.config)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(scored
            .into_iter()
            .map(|scored| {
                let similarity = scored.similarity_score;
                scored.item.with_relevance(similarity)
            })
            .collect())
    }

    /// Scores candidates whose similarity was already attached as
    /// `relevance` by the search read, sorts, truncates.
    fn rank_candidates(&self, candidates: Vec<MemoryItem>, limit: usize) -> Vec<MemoryItem> {
        let now = Utc::now();
        let mut scored: Vec<_> = candidates
            .into_iter()
            .map(|item| {
                let similarity = item.relevance.unwrap_or(0.0);
                score_item(item, similarity, now, &self.config)
            })
            .collect();
        // Stable sort: equal combined scores keep the vector-relevance
        // input order, which is the only tie-break rule.
        scored.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        scored.into_iter().map(|scored| scored.item).collect()
    }

    /// Renders items into a token-bounded context string for LLM prompts.
    ///
    /// Detailed lines read
    /// `{content} (Category: {category}) - Source: {source_type} {source_id} - {timestamp}`
    /// with the source clause omitted when provenance is absent; compact
    /// lines are content-only bullets. Truncation operates on the whole
    /// joined string and may cut mid-item.
    pub fn format_context_for_llm(
        &self,
        items: &[MemoryItem],
        format: Option<ContextFormat>,
        token_limit: Option<usize>,
    ) -> String {
        let format = format.unwrap_or(self.config.context_format);
        let token_limit = token_limit.unwrap_or(self.config.context_token_limit);
        let joined = items
            .iter()
            .map(|item| render_item(item, format))
            .collect::<Vec<_>>()
            .join("\n");
        truncate_to_tokens(&joined, token_limit)
    }
}

fn render_item(item: &MemoryItem, format: ContextFormat) -> String {
    match format {
        ContextFormat::Compact => format!("- {}", item.content),
        ContextFormat::Detailed => {
            let mut line = format!("{} (Category: {})", item.content, item.category);
            if let Some(source_type) = &item.source_type {
                line.push_str(&format!(" - Source: {source_type}"));
                if let Some(source_id) = &item.source_id {
                    line.push(' ');
                    line.push_str(source_id);
                }
            }
            line.push_str(&format!(
                " - {}",
                item.created_at.format(TIMESTAMP_FORMAT)
            ));
            line
        }
    }
}

/// Collapses a read-path error into the empty default, leaving a diagnostic
/// behind on the log and the error counter.
fn degrade<T: Default>(op: &'static str, result: Result<T, MnemaError>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            warn!(op, error = %error, "retrieval degraded to empty result");
            counter!("mnema_retrieval_errors_total", "op" => op).increment(1);
            T::default()
        }
    }
}
