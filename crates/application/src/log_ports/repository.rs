use std::collections::BTreeMap;

use async_trait::async_trait;
use flowtrail_core::{AppResult, TenantId};

use super::queries::LogFilter;
use super::record::ChangeRecord;

/// Persistence port for change records.
#[async_trait]
pub trait ChangeLogRepository: Send + Sync {
    /// Inserts one record.
    ///
    /// A primary-key collision must surface as [`flowtrail_core::AppError::Conflict`]
    /// so the writer can regenerate the id and retry.
    async fn insert(&self, record: &ChangeRecord) -> AppResult<()>;

    /// Returns all records matching the filter within one tenant,
    /// newest first.
    async fn list(&self, tenant_id: &TenantId, filter: &LogFilter) -> AppResult<Vec<ChangeRecord>>;

    /// Returns per-operation-type record counts matching the filter within
    /// one tenant.
    async fn operation_statistics(
        &self,
        tenant_id: &TenantId,
        filter: &LogFilter,
    ) -> AppResult<BTreeMap<String, i64>>;
}
