// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-addressed TTL cache for external search results.
//!
//! Keys are derived deterministically from (normalized query, provider,
//! sorted parameters). Expired entries read as misses and are purged
//! eagerly by the reader; racing purges are benign because removal is
//! idempotent. `cleanup` sweeps the whole map and belongs on a periodic
//! schedule, not the request path.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use metrics::counter;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use mnema_config::model::CacheConfig;

/// Search parameters, keyed deterministically (BTreeMap iterates sorted).
pub type SearchParams = BTreeMap<String, Value>;

/// Lowercase + trim, so formatting differences share a cache slot.
fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Deterministic cache key for a (query, provider, params) triple.
pub fn cache_key(query: &str, provider: &str, params: &SearchParams) -> String {
    let params_json = serde_json::to_string(params).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(normalize(query).as_bytes());
    hasher.update(b"-");
    hasher.update(provider.as_bytes());
    hasher.update(b"-");
    hasher.update(params_json.as_bytes());
    format!("{:x}", hasher.finalize())
}

struct CacheEntry {
    payload: Value,
    stored_at: Instant,
    hit_count: usize,
    // Side-index so selective clearing can match on what the key hashes
    // away. The provider-only and query-only clears filter on these fields
    // exactly instead of substring-matching opaque keys.
    normalized_query: String,
    provider: String,
}

/// Aggregate counters exposed for observability endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_hits: usize,
}

/// Shared, TTL-bounded cache in front of external search providers.
pub struct SearchCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl SearchCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::from_secs(config.ttl_secs),
            max_entries: config.max_entries,
        }
    }

    /// Looks up a cached result.
    ///
    /// An entry past its TTL reads as absent and is deleted as a side
    /// effect of the read.
    pub fn get(&self, query: &str, provider: &str, params: &SearchParams) -> Option<Value> {
        let key = cache_key(query, provider, params);
        let Some(mut entry) = self.entries.get_mut(&key) else {
            counter!("mnema_cache_requests_total", "outcome" => "miss").increment(1);
            return None;
        };
        if entry.stored_at.elapsed() > self.ttl {
            drop(entry);
            // Two readers may race here; the second remove is a no-op.
            self.entries.remove(&key);
            counter!("mnema_cache_requests_total", "outcome" => "expired").increment(1);
            debug!(provider, "expired cache entry purged on read");
            return None;
        }
        entry.hit_count += 1;
        counter!("mnema_cache_requests_total", "outcome" => "hit").increment(1);
        Some(entry.payload.clone())
    }

    /// Stores a result, overwriting any entry under the same key.
    ///
    /// When the cache is full and the key is new, the oldest entry is
    /// evicted first.
    pub fn set(&self, query: &str, provider: &str, params: &SearchParams, result: Value) -> bool {
        let key = cache_key(query, provider, params);
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                payload: result,
                stored_at: Instant::now(),
                hit_count: 0,
                normalized_query: normalize(query),
                provider: provider.to_string(),
            },
        );
        true
    }

    /// Selectively clears entries.
    ///
    /// Both given: entries for that query/provider pair. Query only: every
    /// entry derived from that query. Provider only: every entry from that
    /// provider. Neither: everything. Returns whether anything was removed.
    pub fn clear(&self, query: Option<&str>, provider: Option<&str>) -> bool {
        let before = self.entries.len();
        match (query, provider) {
            (None, None) => self.entries.clear(),
            _ => {
                let normalized = query.map(normalize);
                self.entries.retain(|_, entry| {
                    let query_matches = normalized
                        .as_deref()
                        .is_none_or(|q| entry.normalized_query == q);
                    let provider_matches =
                        provider.is_none_or(|p| entry.provider == p);
                    !(query_matches && provider_matches)
                });
            }
        }
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "cache entries cleared");
        }
        removed > 0
    }

    /// Sweeps every expired entry. Returns the number removed.
    pub fn cleanup(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() <= self.ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            counter!("mnema_cache_evictions_total", "reason" => "expired").increment(removed as u64);
            debug!(removed, "expired cache entries swept");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut total_hits = 0;
        let mut total_entries = 0;
        for entry in self.entries.iter() {
            total_entries += 1;
            total_hits += entry.hit_count;
        }
        CacheStats {
            total_entries,
            total_hits,
        }
    }

    fn evict_oldest(&self) {
        let mut oldest_key: Option<String> = None;
        let mut oldest_time = Instant::now();
        for entry in self.entries.iter() {
            if entry.stored_at <= oldest_time {
                oldest_time = entry.stored_at;
                oldest_key = Some(entry.key().clone());
            }
        }
        if let Some(key) = oldest_key {
            self.entries.remove(&key);
            counter!("mnema_cache_evictions_total", "reason" => "capacity").increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache(ttl_secs: u64, max_entries: usize) -> SearchCache {
        SearchCache::new(CacheConfig {
            ttl_secs,
            max_entries,
        })
    }

    fn params(pairs: &[(&str, Value)]) -> SearchParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn set_then_get_returns_identical_result() {
        let cache = cache(3600, 16);
        let p = params(&[("count", json!(10))]);
        let payload = json!({"results": ["a", "b"]});

        assert!(cache.set("rust memory crates", "searx", &p, payload.clone()));
        let hit = cache.get("rust memory crates", "searx", &p).unwrap();
        assert_eq!(hit, payload);
    }

    #[test]
    fn key_is_deterministic_and_param_order_free() {
        let a = params(&[("a", json!(1)), ("b", json!(2))]);
        let mut b = SearchParams::new();
        b.insert("b".into(), json!(2));
        b.insert("a".into(), json!(1));
        assert_eq!(cache_key("q", "p", &a), cache_key("q", "p", &b));
        assert_ne!(cache_key("q", "p", &a), cache_key("q", "other", &a));
    }

    #[test]
    fn query_normalization_shares_slots() {
        let cache = cache(3600, 16);
        let p = SearchParams::new();
        cache.set("  Rust Memory  ", "searx", &p, json!(1));
        assert_eq!(cache.get("rust memory", "searx", &p), Some(json!(1)));
    }

    #[test]
    fn expired_entry_reads_as_absent_and_is_purged() {
        let cache = cache(0, 16);
        let p = SearchParams::new();
        cache.set("q", "searx", &p, json!("stale"));
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(cache.get("q", "searx", &p), None);
        assert!(cache.is_empty(), "the stale entry is deleted by the read");
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = cache(3600, 16);
        let p = SearchParams::new();
        cache.set("q", "searx", &p, json!("first"));
        cache.set("q", "searx", &p, json!("second"));
        assert_eq!(cache.get("q", "searx", &p), Some(json!("second")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_both_removes_single_pair() {
        let cache = cache(3600, 16);
        let p = SearchParams::new();
        cache.set("q1", "searx", &p, json!(1));
        cache.set("q1", "brave", &p, json!(2));
        cache.set("q2", "searx", &p, json!(3));

        assert!(cache.clear(Some("q1"), Some("searx")));
        assert_eq!(cache.get("q1", "searx", &p), None);
        assert_eq!(cache.get("q1", "brave", &p), Some(json!(2)));
        assert_eq!(cache.get("q2", "searx", &p), Some(json!(3)));
    }

    #[test]
    fn clear_by_query_spans_providers() {
        let cache = cache(3600, 16);
        let p = SearchParams::new();
        cache.set("q1", "searx", &p, json!(1));
        cache.set("Q1", "brave", &p, json!(2));
        cache.set("q2", "searx", &p, json!(3));

        assert!(cache.clear(Some("q1"), None));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("q2", "searx", &p), Some(json!(3)));
    }

    #[test]
    fn clear_by_provider_spans_queries() {
        let cache = cache(3600, 16);
        let p = SearchParams::new();
        cache.set("q1", "searx", &p, json!(1));
        cache.set("q2", "searx", &p, json!(2));
        cache.set("q3", "brave", &p, json!(3));

        assert!(cache.clear(None, Some("searx")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("q3", "brave", &p), Some(json!(3)));
    }

    #[test]
    fn clear_everything() {
        let cache = cache(3600, 16);
        let p = SearchParams::new();
        cache.set("q1", "searx", &p, json!(1));
        cache.set("q2", "brave", &p, json!(2));

        assert!(cache.clear(None, None));
        assert!(cache.is_empty());
        assert!(!cache.clear(None, None), "nothing left to remove");
    }

    #[test]
    fn cleanup_sweeps_only_expired_entries() {
        let cache = cache(0, 16);
        let p = SearchParams::new();
        cache.set("q1", "searx", &p, json!(1));
        cache.set("q2", "searx", &p, json!(2));
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(cache.cleanup(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.cleanup(), 0);
    }

    #[test]
    fn capacity_eviction_drops_oldest() {
        let cache = cache(3600, 2);
        let p = SearchParams::new();
        cache.set("first", "searx", &p, json!(1));
        std::thread::sleep(Duration::from_millis(5));
        cache.set("second", "searx", &p, json!(2));
        std::thread::sleep(Duration::from_millis(5));
        cache.set("third", "searx", &p, json!(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("first", "searx", &p), None, "oldest was evicted");
        assert_eq!(cache.get("third", "searx", &p), Some(json!(3)));
    }

    #[test]
    fn stats_track_entries_and_hits() {
        let cache = cache(3600, 16);
        let p = SearchParams::new();
        cache.set("q", "searx", &p, json!(1));
        cache.get("q", "searx", &p);
        cache.get("q", "searx", &p);

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_hits, 2);
    }

    #[test]
    fn concurrent_access_is_safe() {
        let cache = std::sync::Arc::new(cache(3600, 64));
        let p = SearchParams::new();
        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            let p = p.clone();
            handles.push(std::thread::spawn(move || {
                for j in 0..50 {
                    let query = format!("query-{}", (i + j) % 10);
                    cache.set(&query, "searx", &p, json!(j));
                    cache.get(&query, "searx", &p);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 10);
    }
}
