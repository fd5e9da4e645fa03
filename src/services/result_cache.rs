//! Search result cache
//!
//! TTL memo of completed searches keyed by the canonical filter state. Entries
//! are only evicted lazily when a lookup finds them expired; there is no size
//! bound.

use dashmap::DashMap;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::endpoint::DatasetEndpoint;
use crate::models::fields::ResolvedFields;
use crate::models::filter::SearchFilter;
use crate::services::clock::Clock;
use crate::services::search::SearchOutcome;

/// Deterministic cache key
///
/// Built from a `serde_json` object, whose map keeps keys sorted, so the
/// serialized form does not depend on construction order. Department codes and
/// natures are sorted since they act as sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(endpoint: &DatasetEndpoint, filter: &SearchFilter, fields: &ResolvedFields) -> Self {
        let mut dept_codes: Vec<&str> = filter.dept_codes.iter().map(|c| c.trim()).collect();
        dept_codes.sort_unstable();
        dept_codes.dedup();

        let mut natures: Vec<&str> = filter.natures.iter().map(|n| n.trim()).collect();
        natures.sort_unstable();
        natures.dedup();

        let key = json!({
            "base": endpoint.base_url(),
            "dataset": endpoint.dataset_id(),
            "keywords": filter.keywords.trim(),
            "cpv_prefix": filter.cpv_prefix.trim(),
            "training": filter.training,
            "dept_codes": dept_codes,
            "buyer": filter.trimmed_buyer(),
            "date_from": filter.date_from,
            "date_to": filter.date_to,
            "natures": natures,
            "sort": filter.sort,
            "page": filter.page,
            "page_size": filter.page_size,
            "fields": fields,
        });

        CacheKey(key.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait ResultCache: Send + Sync {
    /// Fresh entry for the key; an expired entry is removed and reported as a miss
    fn get(&self, key: &CacheKey) -> Option<SearchOutcome>;

    /// Insert or overwrite
    fn put(&self, key: CacheKey, outcome: SearchOutcome);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: SearchOutcome,
    stored_at: Instant,
}

pub struct TtlResultCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TtlResultCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) >= self.ttl
    }
}

impl ResultCache for TtlResultCache {
    fn get(&self, key: &CacheKey) -> Option<SearchOutcome> {
        let now = self.clock.now();

        // Ref must be dropped before remove_if on the same shard
        let fresh = {
            let entry = self.entries.get(key)?;
            if self.is_expired(&entry, now) {
                None
            } else {
                Some(entry.outcome.clone())
            }
        };

        if fresh.is_none()
            && self
                .entries
                .remove_if(key, |_, entry| self.is_expired(entry, now))
                .is_some()
        {
            debug!("Evicted expired result cache entry");
        }

        fresh
    }

    fn put(&self, key: CacheKey, outcome: SearchOutcome) {
        self.entries.insert(
            key,
            CacheEntry {
                outcome,
                stored_at: self.clock.now(),
            },
        );
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
