use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use flowtrail_application::log_ports::{ChangeLogRepository, ChangeRecord, LogFilter};
use flowtrail_core::{AppError, AppResult, TenantId};

/// In-memory repository adapter for development and tests.
#[derive(Default)]
pub struct InMemoryChangeLogRepository {
    records: RwLock<Vec<ChangeRecord>>,
}

impl InMemoryChangeLogRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(record: &ChangeRecord, tenant_id: &TenantId, filter: &LogFilter) -> bool {
    if record.tenant_id != *tenant_id {
        return false;
    }
    if filter
        .business_module
        .is_some_and(|module| record.business_module != module)
    {
        return false;
    }
    if filter
        .business_id
        .as_deref()
        .is_some_and(|id| record.business_id != id)
    {
        return false;
    }
    if filter
        .onboarding_id
        .as_deref()
        .is_some_and(|id| record.onboarding_id.as_deref() != Some(id))
    {
        return false;
    }
    if filter
        .stage_id
        .as_deref()
        .is_some_and(|id| record.stage_id.as_deref() != Some(id))
    {
        return false;
    }

    !filter
        .operation_type
        .is_some_and(|operation| record.operation_type != operation)
}

#[async_trait]
impl ChangeLogRepository for InMemoryChangeLogRepository {
    async fn insert(&self, record: &ChangeRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(AppError::Conflict(format!(
                "change record '{}' already exists",
                record.id
            )));
        }

        records.push(record.clone());
        Ok(())
    }

    async fn list(&self, tenant_id: &TenantId, filter: &LogFilter) -> AppResult<Vec<ChangeRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<ChangeRecord> = records
            .iter()
            .filter(|record| matches(record, tenant_id, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.operation_time.cmp(&a.operation_time));

        Ok(matching)
    }

    async fn operation_statistics(
        &self,
        tenant_id: &TenantId,
        filter: &LogFilter,
    ) -> AppResult<BTreeMap<String, i64>> {
        let records = self.records.read().await;
        let mut statistics = BTreeMap::new();
        // Statistics ignore the operation type dimension; it is the axis
        // being counted.
        let filter = LogFilter {
            operation_type: None,
            ..filter.clone()
        };
        for record in records.iter() {
            if matches(record, tenant_id, &filter) {
                *statistics
                    .entry(record.operation_type.as_str().to_owned())
                    .or_insert(0) += 1;
            }
        }

        Ok(statistics)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use flowtrail_domain::{BusinessModule, OperationStatus, OperationType};
    use uuid::Uuid;

    use super::*;

    fn record(module: BusinessModule, operation: OperationType, minutes_ago: i64) -> ChangeRecord {
        ChangeRecord {
            id: Uuid::new_v4(),
            operation_type: operation,
            business_module: module,
            business_id: "42".to_owned(),
            onboarding_id: Some("55".to_owned()),
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
            operation_time: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn duplicate_ids_conflict() {
        let repository = InMemoryChangeLogRepository::new();
        let first = record(BusinessModule::Stage, OperationType::Update, 1);
        let duplicate = first.clone();

        assert!(repository.insert(&first).await.is_ok());
        assert!(matches!(
            repository.insert(&duplicate).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let repository = InMemoryChangeLogRepository::new();
        let older = record(BusinessModule::Stage, OperationType::Update, 10);
        let newer = record(BusinessModule::Stage, OperationType::Update, 1);
        let other = record(BusinessModule::Workflow, OperationType::Create, 5);
        for entry in [&older, &newer, &other] {
            repository
                .insert(entry)
                .await
                .unwrap_or_else(|_| unreachable!());
        }

        let filter = LogFilter {
            business_module: Some(BusinessModule::Stage),
            ..LogFilter::default()
        };
        let listed = repository
            .list(&TenantId::fallback(), &filter)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[tokio::test]
    async fn statistics_count_per_operation_type() {
        let repository = InMemoryChangeLogRepository::new();
        for entry in [
            record(BusinessModule::Stage, OperationType::Update, 1),
            record(BusinessModule::Stage, OperationType::Update, 2),
            record(BusinessModule::Stage, OperationType::Create, 3),
        ] {
            repository
                .insert(&entry)
                .await
                .unwrap_or_else(|_| unreachable!());
        }

        let statistics = repository
            .operation_statistics(&TenantId::fallback(), &LogFilter::default())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(statistics.get("update"), Some(&2));
        assert_eq!(statistics.get("create"), Some(&1));
    }
}
