//! In-process listing result cache (Moka).
//!
//! Only descriptors flagged `cacheable` go through the cache. Entries are
//! keyed by the rendered SQL, so two requests share an entry exactly when
//! they would run the same statement.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

/// Maximum number of cached results.
const MAX_CAPACITY: u64 = 10_000;

/// A cached listing or count result.
#[derive(Debug, Clone)]
pub enum CachedResult {
    Rows(Arc<Vec<serde_json::Value>>),
    Count(u64),
}

/// Listing result cache.
#[derive(Clone)]
pub struct ResultCache {
    local: Cache<String, CachedResult>,
}

impl ResultCache {
    /// Create a cache with the given TTL. Returns `None` for a zero TTL.
    pub fn new(ttl_secs: u64) -> Option<Self> {
        if ttl_secs == 0 {
            return None;
        }

        let local = Cache::builder()
            .max_capacity(MAX_CAPACITY)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Some(Self { local })
    }

    /// Cache key for a listing statement.
    pub fn rows_key(sql: &str) -> String {
        format!("rows:{sql}")
    }

    /// Cache key for a count statement.
    pub fn count_key(sql: &str) -> String {
        format!("count:{sql}")
    }

    pub async fn get_rows(&self, sql: &str) -> Option<Arc<Vec<serde_json::Value>>> {
        match self.local.get(&Self::rows_key(sql)).await {
            Some(CachedResult::Rows(rows)) => {
                debug!(rows = rows.len(), "listing cache hit");
                Some(rows)
            }
            _ => None,
        }
    }

    pub async fn put_rows(&self, sql: &str, rows: Arc<Vec<serde_json::Value>>) {
        self.local
            .insert(Self::rows_key(sql), CachedResult::Rows(rows))
            .await;
    }

    pub async fn get_count(&self, sql: &str) -> Option<u64> {
        match self.local.get(&Self::count_key(sql)).await {
            Some(CachedResult::Count(total)) => {
                debug!(total, "count cache hit");
                Some(total)
            }
            _ => None,
        }
    }

    pub async fn put_count(&self, sql: &str, total: u64) {
        self.local
            .insert(Self::count_key(sql), CachedResult::Count(total))
            .await;
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache").finish()
    }
}
