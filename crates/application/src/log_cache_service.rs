use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flowtrail_domain::BusinessModule;
use tracing::{debug, warn};

use crate::cache_keys::{
    KNOWN_PAGE_INDEXES, KNOWN_PAGE_SIZES, LOG_PAGE_TTL_SECONDS, STATS_TTL_SECONDS, logs_key,
    stats_key,
};
use crate::log_ports::{ChangeRecord, LogCache, LogFilter, PagedResult};

const LOGS_NAMESPACE: &str = "operation_logs";
const STATS_NAMESPACE: &str = "operation_stats";

/// Hit/miss counters for one cache service instance.
///
/// Counters are injected rather than process-wide so tests and multiple
/// service instances never observe each other.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Returns the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    /// Reads served from cache.
    pub hits: u64,
    /// Reads that fell through to the repository.
    pub misses: u64,
}

impl CacheMetricsSnapshot {
    /// Hit percentage over all reads, zero when nothing was read.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }

        (self.hits as f64 / total as f64) * 100.0
    }
}

/// Cache layer for log pages and statistics.
///
/// All failures degrade: reads count as misses, writes and removals are
/// logged and swallowed. Callers never see a cache error.
#[derive(Clone)]
pub struct LogCacheService {
    cache: Arc<dyn LogCache>,
    metrics: Arc<CacheMetrics>,
    log_ttl_seconds: u32,
    stats_ttl_seconds: u32,
}

impl LogCacheService {
    /// Creates a cache service with the standard TTLs.
    #[must_use]
    pub fn new(cache: Arc<dyn LogCache>, metrics: Arc<CacheMetrics>) -> Self {
        Self {
            cache,
            metrics,
            log_ttl_seconds: LOG_PAGE_TTL_SECONDS,
            stats_ttl_seconds: STATS_TTL_SECONDS,
        }
    }

    /// Overrides the TTLs.
    #[must_use]
    pub fn with_ttls(mut self, log_ttl_seconds: u32, stats_ttl_seconds: u32) -> Self {
        self.log_ttl_seconds = log_ttl_seconds;
        self.stats_ttl_seconds = stats_ttl_seconds;
        self
    }

    /// Returns a cached log page.
    pub async fn get_log_page(&self, key: &str) -> Option<PagedResult<ChangeRecord>> {
        self.get_json(LOGS_NAMESPACE, key).await
    }

    /// Caches a log page.
    pub async fn set_log_page(&self, key: &str, page: &PagedResult<ChangeRecord>) {
        self.set_json(LOGS_NAMESPACE, key, page, self.log_ttl_seconds)
            .await;
    }

    /// Returns a cached statistics map.
    pub async fn get_statistics(&self, key: &str) -> Option<BTreeMap<String, i64>> {
        self.get_json(STATS_NAMESPACE, key).await
    }

    /// Caches a statistics map.
    pub async fn set_statistics(&self, key: &str, statistics: &BTreeMap<String, i64>) {
        self.set_json(STATS_NAMESPACE, key, statistics, self.stats_ttl_seconds)
            .await;
    }

    /// Invalidates cached pages and statistics for one entity.
    pub async fn invalidate_for_business(&self, module: BusinessModule, business_id: &str) {
        let filter = LogFilter {
            business_module: Some(module),
            business_id: Some(business_id.to_owned()),
            ..LogFilter::default()
        };
        self.remove_candidates(&filter).await;
    }

    /// Invalidates cached pages and statistics for one case, across every
    /// module partition.
    pub async fn invalidate_for_onboarding(&self, onboarding_id: &str) {
        for module in Self::module_partitions() {
            let filter = LogFilter {
                business_module: module,
                onboarding_id: Some(onboarding_id.to_owned()),
                ..LogFilter::default()
            };
            self.remove_candidates(&filter).await;
        }
    }

    /// Invalidates cached pages and statistics for one stage, across every
    /// module partition.
    pub async fn invalidate_for_stage(&self, stage_id: &str) {
        for module in Self::module_partitions() {
            let filter = LogFilter {
                business_module: module,
                stage_id: Some(stage_id.to_owned()),
                ..LogFilter::default()
            };
            self.remove_candidates(&filter).await;
        }
    }

    /// Removes every enumerable dimensionless key and resets the counters.
    ///
    /// Keys carrying entity ids cannot be enumerated without the ids and are
    /// left to their TTLs.
    pub async fn clear_all(&self) {
        for module in Self::module_partitions() {
            let filter = LogFilter {
                business_module: module,
                ..LogFilter::default()
            };
            self.remove_candidates(&filter).await;
        }
        self.metrics.reset();
    }

    /// Returns the current hit/miss counters.
    #[must_use]
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    // Every module partition plus the module-less "all" partition.
    fn module_partitions() -> impl Iterator<Item = Option<BusinessModule>> {
        BusinessModule::ALL.into_iter().map(Some).chain([None])
    }

    // Known page indexes x known page sizes, plus the statistics key.
    async fn remove_candidates(&self, filter: &LogFilter) {
        for page_index in KNOWN_PAGE_INDEXES {
            for page_size in KNOWN_PAGE_SIZES {
                let key = logs_key(filter, page_index, page_size);
                self.remove(LOGS_NAMESPACE, &key).await;
            }
        }
        self.remove(STATS_NAMESPACE, &stats_key(filter)).await;
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        namespace: &str,
        key: &str,
    ) -> Option<T> {
        let full_key = format!("{namespace}:{key}");
        match self.cache.get_string(&full_key).await {
            Ok(Some(text)) => match serde_json::from_str::<T>(&text) {
                Ok(value) => {
                    self.metrics.record_hit();
                    Some(value)
                }
                Err(error) => {
                    warn!(key = %full_key, %error, "discarding undecodable cache entry");
                    self.metrics.record_miss();
                    None
                }
            },
            Ok(None) => {
                self.metrics.record_miss();
                None
            }
            Err(error) => {
                warn!(key = %full_key, %error, "cache read failed, treating as miss");
                self.metrics.record_miss();
                None
            }
        }
    }

    async fn set_json<T: serde::Serialize>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        ttl_seconds: u32,
    ) {
        let full_key = format!("{namespace}:{key}");
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(error) => {
                warn!(key = %full_key, %error, "failed to encode cache entry");
                return;
            }
        };

        if let Err(error) = self.cache.set_string(&full_key, &text, ttl_seconds).await {
            warn!(key = %full_key, %error, "cache write failed");
        }
    }

    async fn remove(&self, namespace: &str, key: &str) {
        let full_key = format!("{namespace}:{key}");
        if let Err(error) = self.cache.remove(&full_key).await {
            warn!(key = %full_key, %error, "cache removal failed");
        } else {
            debug!(key = %full_key, "cache key invalidated");
        }
    }
}

#[cfg(test)]
mod tests;
