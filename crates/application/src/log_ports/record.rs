use chrono::{DateTime, Utc};
use flowtrail_core::TenantId;
use flowtrail_domain::{BusinessModule, OperationStatus, OperationType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable audit record.
///
/// Records are append-only: nothing updates or deletes them after insert.
/// Snapshots are stored as opaque JSON text exactly as captured; only the
/// description is rendered prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Primary identifier. Regenerated when an insert hits an id conflict.
    pub id: Uuid,
    /// What was done.
    pub operation_type: OperationType,
    /// What kind of entity it was done to.
    pub business_module: BusinessModule,
    /// Identifier of the entity within its module.
    pub business_id: String,
    /// Owning case, when the entity lives inside one.
    pub onboarding_id: Option<String>,
    /// Owning stage, when the entity lives inside one.
    pub stage_id: Option<String>,
    /// Whether the audited operation itself succeeded.
    pub status: OperationStatus,
    /// Short title, such as "Stage Updated".
    pub title: String,
    /// Rendered human-readable description.
    pub description: String,
    /// Entity snapshot before the operation, as JSON text.
    pub before_snapshot: Option<String>,
    /// Entity snapshot after the operation, as JSON text.
    pub after_snapshot: Option<String>,
    /// Names of fields that meaningfully changed.
    pub changed_fields: Option<Vec<String>>,
    /// Free-form JSON payload attached by the producer.
    pub extended_data: Option<String>,
    /// Stable id of the operator.
    pub operator_id: String,
    /// Display name of the operator at the time of the operation.
    pub operator_name: String,
    /// Tenant partition the record belongs to.
    pub tenant_id: TenantId,
    /// Application code the operation came in through.
    pub app_code: Option<String>,
    /// Client address, when the operation had an HTTP origin.
    pub ip_address: Option<String>,
    /// Client user agent, when the operation had an HTTP origin.
    pub user_agent: Option<String>,
    /// Producer-defined origin tag.
    pub source: Option<String>,
    /// When the audited operation happened, UTC.
    pub operation_time: DateTime<Utc>,
}

impl ChangeRecord {
    /// Replaces the record id ahead of an insert retry.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }
}
