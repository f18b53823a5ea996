use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use flowtrail_application::log_ports::{ChangeLogRepository, ChangeRecord, LogFilter};
use flowtrail_core::{AppError, AppResult, TenantId};
use flowtrail_domain::{BusinessModule, OperationStatus, OperationType};

/// PostgreSQL-backed repository for change records.
#[derive(Clone)]
pub struct PostgresChangeLogRepository {
    pool: PgPool,
}

impl PostgresChangeLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ChangeRecordRow {
    id: uuid::Uuid,
    operation_type: String,
    business_module: String,
    business_id: String,
    onboarding_id: Option<String>,
    stage_id: Option<String>,
    status: String,
    title: String,
    description: String,
    before_snapshot: Option<String>,
    after_snapshot: Option<String>,
    changed_fields: Option<String>,
    extended_data: Option<String>,
    operator_id: String,
    operator_name: String,
    tenant_id: String,
    app_code: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    source: Option<String>,
    operation_time: DateTime<Utc>,
}

impl ChangeRecordRow {
    fn into_record(self) -> AppResult<ChangeRecord> {
        let changed_fields = self
            .changed_fields
            .as_deref()
            .map(serde_json::from_str::<Vec<String>>)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!("invalid changed_fields column: {error}"))
            })?;

        Ok(ChangeRecord {
            id: self.id,
            operation_type: OperationType::parse(&self.operation_type)?,
            business_module: BusinessModule::parse(&self.business_module)?,
            business_id: self.business_id,
            onboarding_id: self.onboarding_id,
            stage_id: self.stage_id,
            status: OperationStatus::parse(&self.status)?,
            title: self.title,
            description: self.description,
            before_snapshot: self.before_snapshot,
            after_snapshot: self.after_snapshot,
            changed_fields,
            extended_data: self.extended_data,
            operator_id: self.operator_id,
            operator_name: self.operator_name,
            tenant_id: TenantId::new(self.tenant_id)?,
            app_code: self.app_code,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            source: self.source,
            operation_time: self.operation_time,
        })
    }
}

#[async_trait]
impl ChangeLogRepository for PostgresChangeLogRepository {
    async fn insert(&self, record: &ChangeRecord) -> AppResult<()> {
        let changed_fields = record
            .changed_fields
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!("failed to encode changed_fields: {error}"))
            })?;

        let result = sqlx::query(
            r#"
            INSERT INTO ft_change_records (
                id, operation_type, business_module, business_id, onboarding_id,
                stage_id, status, title, description, before_snapshot,
                after_snapshot, changed_fields, extended_data, operator_id,
                operator_name, tenant_id, app_code, ip_address, user_agent,
                source, operation_time
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(record.id)
        .bind(record.operation_type.as_str())
        .bind(record.business_module.as_str())
        .bind(record.business_id.as_str())
        .bind(record.onboarding_id.as_deref())
        .bind(record.stage_id.as_deref())
        .bind(record.status.as_str())
        .bind(record.title.as_str())
        .bind(record.description.as_str())
        .bind(record.before_snapshot.as_deref())
        .bind(record.after_snapshot.as_deref())
        .bind(changed_fields.as_deref())
        .bind(record.extended_data.as_deref())
        .bind(record.operator_id.as_str())
        .bind(record.operator_name.as_str())
        .bind(record.tenant_id.as_str())
        .bind(record.app_code.as_deref())
        .bind(record.ip_address.as_deref())
        .bind(record.user_agent.as_deref())
        .bind(record.source.as_deref())
        .bind(record.operation_time)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(format!(
                        "change record '{}' already exists",
                        record.id
                    )));
                }

                Err(AppError::Internal(format!(
                    "failed to insert change record: {error}"
                )))
            }
        }
    }

    async fn list(&self, tenant_id: &TenantId, filter: &LogFilter) -> AppResult<Vec<ChangeRecord>> {
        let rows = sqlx::query_as::<_, ChangeRecordRow>(
            r#"
            SELECT
                id, operation_type, business_module, business_id, onboarding_id,
                stage_id, status, title, description, before_snapshot,
                after_snapshot, changed_fields, extended_data, operator_id,
                operator_name, tenant_id, app_code, ip_address, user_agent,
                source, operation_time
            FROM ft_change_records
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR business_module = $2)
                AND ($3::TEXT IS NULL OR business_id = $3)
                AND ($4::TEXT IS NULL OR onboarding_id = $4)
                AND ($5::TEXT IS NULL OR stage_id = $5)
                AND ($6::TEXT IS NULL OR operation_type = $6)
            ORDER BY operation_time DESC
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(filter.business_module.map(|module| module.as_str()))
        .bind(filter.business_id.as_deref())
        .bind(filter.onboarding_id.as_deref())
        .bind(filter.stage_id.as_deref())
        .bind(filter.operation_type.map(|operation| operation.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list change records: {error}")))?;

        rows.into_iter().map(ChangeRecordRow::into_record).collect()
    }

    async fn operation_statistics(
        &self,
        tenant_id: &TenantId,
        filter: &LogFilter,
    ) -> AppResult<BTreeMap<String, i64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT operation_type, COUNT(*) AS record_count
            FROM ft_change_records
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR business_module = $2)
                AND ($3::TEXT IS NULL OR business_id = $3)
                AND ($4::TEXT IS NULL OR onboarding_id = $4)
                AND ($5::TEXT IS NULL OR stage_id = $5)
            GROUP BY operation_type
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(filter.business_module.map(|module| module.as_str()))
        .bind(filter.business_id.as_deref())
        .bind(filter.onboarding_id.as_deref())
        .bind(filter.stage_id.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count change records: {error}"))
        })?;

        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests;
