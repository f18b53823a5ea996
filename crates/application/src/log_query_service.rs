use std::collections::BTreeMap;
use std::sync::Arc;

use flowtrail_core::TenantId;
use tracing::error;

use crate::cache_keys::{logs_key, stats_key};
use crate::log_cache_service::LogCacheService;
use crate::log_ports::{ChangeLogRepository, ChangeRecord, LogPageQuery, PagedResult};

/// Read-side facade over the change log.
///
/// Every read goes through the cache first. Repository failures degrade to
/// an empty result; readers never see an error.
#[derive(Clone)]
pub struct LogQueryService {
    repository: Arc<dyn ChangeLogRepository>,
    cache: LogCacheService,
}

impl LogQueryService {
    /// Creates a query service over the given repository and cache.
    #[must_use]
    pub fn new(repository: Arc<dyn ChangeLogRepository>, cache: LogCacheService) -> Self {
        Self { repository, cache }
    }

    /// Returns one page of change records, newest first.
    pub async fn get_logs(
        &self,
        tenant_id: &TenantId,
        query: &LogPageQuery,
    ) -> PagedResult<ChangeRecord> {
        let page_index = query.effective_page_index();
        let page_size = query.effective_page_size();
        let key = logs_key(&query.filter, page_index, page_size);

        if let Some(page) = self.cache.get_log_page(&key).await {
            return page;
        }

        let mut records = match self.repository.list(tenant_id, &query.filter).await {
            Ok(records) => records,
            Err(err) => {
                error!(%err, "change log query failed");
                return PagedResult::empty(query);
            }
        };
        records.sort_by(|a, b| b.operation_time.cmp(&a.operation_time));

        let total_count = records.len() as u64;
        let offset = (page_index as usize - 1).saturating_mul(page_size as usize);
        let items: Vec<ChangeRecord> = records
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        let page = PagedResult {
            items,
            total_count,
            page_index,
            page_size,
        };
        self.cache.set_log_page(&key, &page).await;
        page
    }

    /// Returns per-operation-type record counts.
    pub async fn get_statistics(
        &self,
        tenant_id: &TenantId,
        query: &LogPageQuery,
    ) -> BTreeMap<String, i64> {
        let key = stats_key(&query.filter);
        if let Some(statistics) = self.cache.get_statistics(&key).await {
            return statistics;
        }

        let statistics = match self
            .repository
            .operation_statistics(tenant_id, &query.filter)
            .await
        {
            Ok(statistics) => statistics,
            Err(err) => {
                error!(%err, "change log statistics query failed");
                return BTreeMap::new();
            }
        };

        self.cache.set_statistics(&key, &statistics).await;
        statistics
    }
}
