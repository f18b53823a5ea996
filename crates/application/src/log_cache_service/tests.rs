use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use flowtrail_core::{AppError, AppResult, TenantId};
use flowtrail_domain::{BusinessModule, OperationStatus, OperationType};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CacheMetrics, LogCacheService};
use crate::cache_keys::logs_key;
use crate::log_ports::{ChangeRecord, LogCache, LogFilter, PagedResult};

#[derive(Default)]
struct FakeLogCache {
    entries: Mutex<HashMap<String, String>>,
    removed: Mutex<Vec<String>>,
    fail_reads: bool,
}

#[async_trait]
impl LogCache for FakeLogCache {
    async fn get_string(&self, key: &str) -> AppResult<Option<String>> {
        if self.fail_reads {
            return Err(AppError::Internal("cache offline".to_owned()));
        }

        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_string(&self, key: &str, value: &str, _ttl_seconds: u32) -> AppResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.lock().await.remove(key);
        self.removed.lock().await.push(key.to_owned());
        Ok(())
    }
}

fn build_service(cache: Arc<FakeLogCache>) -> LogCacheService {
    LogCacheService::new(cache, Arc::new(CacheMetrics::new()))
}

fn sample_page() -> PagedResult<ChangeRecord> {
    PagedResult {
        items: vec![ChangeRecord {
            id: Uuid::new_v4(),
            operation_type: OperationType::Update,
            business_module: BusinessModule::Stage,
            business_id: "42".to_owned(),
            onboarding_id: None,
            stage_id: None,
            status: OperationStatus::Success,
            title: "Stage Updated".to_owned(),
            description: "Stage 'Intake' has been updated by Dana".to_owned(),
            before_snapshot: None,
            after_snapshot: None,
            changed_fields: None,
            extended_data: None,
            operator_id: "u-1".to_owned(),
            operator_name: "Dana".to_owned(),
            tenant_id: TenantId::fallback(),
            app_code: None,
            ip_address: None,
            user_agent: None,
            source: None,
            operation_time: Utc::now(),
        }],
        total_count: 1,
        page_index: 1,
        page_size: 20,
    }
}

fn stage_filter() -> LogFilter {
    LogFilter {
        business_module: Some(BusinessModule::Stage),
        business_id: Some("42".to_owned()),
        ..LogFilter::default()
    }
}

#[tokio::test]
async fn counters_track_misses_then_hits() {
    let cache = Arc::new(FakeLogCache::default());
    let service = build_service(Arc::clone(&cache));
    let key = logs_key(&stage_filter(), 1, 20);

    assert!(service.get_log_page(&key).await.is_none());
    service.set_log_page(&key, &sample_page()).await;
    assert!(service.get_log_page(&key).await.is_some());
    assert!(service.get_log_page(&key).await.is_some());

    let metrics = service.metrics();
    assert_eq!(metrics.hits, 2);
    assert_eq!(metrics.misses, 1);
    assert!((metrics.hit_rate() - 66.666).abs() < 0.1);
}

#[tokio::test]
async fn clear_all_resets_counters() {
    let cache = Arc::new(FakeLogCache::default());
    let service = build_service(Arc::clone(&cache));

    assert!(service.get_log_page("logs:all:page_1_20").await.is_none());
    service.clear_all().await;

    let metrics = service.metrics();
    assert_eq!(metrics.hits, 0);
    assert_eq!(metrics.misses, 0);
    assert_eq!(metrics.hit_rate(), 0.0);
}

#[tokio::test]
async fn business_invalidation_removes_known_page_sizes_only() {
    let cache = Arc::new(FakeLogCache::default());
    let service = build_service(Arc::clone(&cache));
    let filter = stage_filter();

    let common_key = logs_key(&filter, 1, 20);
    let unusual_key = logs_key(&filter, 1, 37);
    service.set_log_page(&common_key, &sample_page()).await;
    service.set_log_page(&unusual_key, &sample_page()).await;

    service.invalidate_for_business(BusinessModule::Stage, "42").await;

    assert!(service.get_log_page(&common_key).await.is_none());
    // The odd page size is outside the enumerated key set and survives
    // until its TTL expires.
    assert!(service.get_log_page(&unusual_key).await.is_some());
}

#[tokio::test]
async fn onboarding_invalidation_sweeps_every_module_partition() {
    let cache = Arc::new(FakeLogCache::default());
    let service = build_service(Arc::clone(&cache));

    service.invalidate_for_onboarding("55").await;

    let removed = cache.removed.lock().await;
    assert!(removed.contains(&"operation_logs:logs:workflow:onboarding_55:page_1_10".to_owned()));
    assert!(removed.contains(&"operation_logs:logs:all:onboarding_55:page_3_50".to_owned()));
    assert!(removed.contains(&"operation_stats:stats:onboarding:onboarding_55".to_owned()));
}

#[tokio::test]
async fn read_failure_counts_as_miss() {
    let cache = Arc::new(FakeLogCache {
        fail_reads: true,
        ..FakeLogCache::default()
    });
    let service = build_service(Arc::clone(&cache));

    assert!(service.get_log_page("logs:all:page_1_20").await.is_none());
    assert_eq!(service.metrics().misses, 1);
}

#[tokio::test]
async fn undecodable_entry_counts_as_miss() {
    let cache = Arc::new(FakeLogCache::default());
    cache
        .entries
        .lock()
        .await
        .insert("operation_logs:bad".to_owned(), "{not json".to_owned());
    let service = build_service(Arc::clone(&cache));

    assert!(service.get_log_page("bad").await.is_none());
    assert_eq!(service.metrics().misses, 1);
}
