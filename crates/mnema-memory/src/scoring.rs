// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Score fusion for memory ranking: similarity x recency x importance.
//!
//! Recency decays hyperbolically with item age and never reaches zero; an
//! item created "now" scores exactly 1.0. The combined score is a weighted
//! sum clamped to [0, 1]. The weights conceptually sum to 1.0, but the sum
//! is deliberately not enforced -- downstream ranking depends on the exact
//! defaults in [`RetrievalConfig`].

use chrono::{DateTime, Utc};
use mnema_config::model::RetrievalConfig;

use crate::types::{MemoryItem, ScoredMemoryItem};

/// Hours after which recency decays to one half.
pub const RECENCY_SCALE_HOURS: f32 = 24.0;

/// Importance values live in 1..=5; the combined score normalizes by this.
pub const MAX_IMPORTANCE: u8 = 5;

/// Time-decay score for an item created at `created_at`, evaluated at `now`.
///
/// `1 / (1 + age_hours / 24)`, clamped to [0, 1]. Clock skew that puts
/// `created_at` in the future counts as zero age.
pub fn recency_score(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let age_ms = (now - created_at).num_milliseconds().max(0);
    let age_hours = age_ms as f32 / 3_600_000.0;
    (1.0 / (1.0 + age_hours / RECENCY_SCALE_HOURS)).clamp(0.0, 1.0)
}

/// Weighted fusion of similarity, recency, and normalized importance.
pub fn combined_score(
    similarity: f32,
    recency: f32,
    importance: u8,
    config: &RetrievalConfig,
) -> f32 {
    let importance_norm = f32::from(importance) / f32::from(MAX_IMPORTANCE);
    (config.similarity_weight * similarity
        + config.recency_weight * recency
        + config.importance_weight * importance_norm)
        .clamp(0.0, 1.0)
}

/// Annotates an item with its three ranking scores.
pub fn score_item(
    item: MemoryItem,
    similarity: f32,
    now: DateTime<Utc>,
    config: &RetrievalConfig,
) -> ScoredMemoryItem {
    let similarity = similarity.clamp(0.0, 1.0);
    let recency = recency_score(item.created_at, now);
    let combined = combined_score(similarity, recency, item.importance, config);
    ScoredMemoryItem {
        item,
        similarity_score: similarity,
        recency_score: recency,
        combined_score: combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    #[test]
    fn recency_of_zero_age_is_one() {
        let now = Utc::now();
        assert_eq!(recency_score(now, now), 1.0);
    }

    #[test]
    fn recency_of_one_day_is_one_half() {
        let now = Utc::now();
        let score = recency_score(now - Duration::hours(24), now);
        assert!((score - 0.5).abs() < 1e-4, "got {score}");
    }

    #[test]
    fn future_created_at_counts_as_zero_age() {
        let now = Utc::now();
        assert_eq!(recency_score(now + Duration::hours(3), now), 1.0);
    }

    #[test]
    fn combined_uses_default_weights() {
        let config = RetrievalConfig::default();
        // s=1, r=1, i=5: 0.65 + 0.25 + 0.10 = 1.0
        let full = combined_score(1.0, 1.0, 5, &config);
        assert!((full - 1.0).abs() < 1e-6);
        // s=0, r=0, i=1: only the importance term, 0.10 * 0.2 = 0.02
        let floor = combined_score(0.0, 0.0, 1, &config);
        assert!((floor - 0.02).abs() < 1e-6);
    }

    #[test]
    fn weight_sum_is_not_enforced() {
        let config = RetrievalConfig {
            similarity_weight: 0.9,
            recency_weight: 0.9,
            importance_weight: 0.9,
            ..RetrievalConfig::default()
        };
        // Overweighted inputs clamp instead of erroring.
        assert_eq!(combined_score(1.0, 1.0, 5, &config), 1.0);
    }

    #[test]
    fn similar_item_outranks_given_equal_age_and_importance() {
        let config = RetrievalConfig::default();
        let now = Utc::now();
        let high = combined_score(1.0, recency_score(now, now), 1, &config);
        let low = combined_score(0.4, recency_score(now, now), 1, &config);
        assert!(high > low);
    }

    proptest! {
        #[test]
        fn recency_is_in_unit_interval_and_positive(age_hours in 0.0f32..100_000.0) {
            let now = Utc::now();
            let created = now - Duration::milliseconds((age_hours * 3_600_000.0) as i64);
            let score = recency_score(created, now);
            prop_assert!(score > 0.0);
            prop_assert!(score <= 1.0);
        }

        #[test]
        fn recency_is_strictly_decreasing(age_hours in 0.0f32..10_000.0, delta in 1.0f32..1_000.0) {
            let now = Utc::now();
            let younger = now - Duration::milliseconds((age_hours * 3_600_000.0) as i64);
            let older = now - Duration::milliseconds(((age_hours + delta) * 3_600_000.0) as i64);
            prop_assert!(recency_score(older, now) < recency_score(younger, now));
        }

        #[test]
        fn combined_is_in_unit_interval(
            similarity in 0.0f32..=1.0,
            recency in 0.0f32..=1.0,
            importance in 1u8..=5,
        ) {
            let config = RetrievalConfig::default();
            let score = combined_score(similarity, recency, importance, &config);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
