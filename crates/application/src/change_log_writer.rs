use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flowtrail_core::{AppError, OperatorIdentity};
use flowtrail_domain::{
    BusinessModule, OperationStatus, OperationType, Snapshot, changed_field_names, is_equivalent,
};
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::description_builder::{DescriptionBuilder, DescriptionInput};
use crate::log_cache_service::LogCacheService;
use crate::log_ports::{ChangeLogRepository, ChangeRecord, OperatorContext};

const MAX_INSERT_ATTEMPTS: u32 = 3;

/// One operation to be recorded.
///
/// Built with the `with_` methods; only the constructor arguments are
/// mandatory.
#[derive(Debug, Clone)]
pub struct LogOperationInput {
    operation_type: OperationType,
    business_module: BusinessModule,
    business_id: String,
    entity_name: String,
    onboarding_id: Option<String>,
    stage_id: Option<String>,
    before_snapshot: Option<String>,
    after_snapshot: Option<String>,
    related_entity_name: Option<String>,
    reason: Option<String>,
    operator: Option<OperatorIdentity>,
    extended_data: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    source: Option<String>,
    status: OperationStatus,
}

impl LogOperationInput {
    /// Creates an input for one operation on one entity.
    #[must_use]
    pub fn new(
        operation_type: OperationType,
        business_module: BusinessModule,
        business_id: impl Into<String>,
        entity_name: impl Into<String>,
    ) -> Self {
        Self {
            operation_type,
            business_module,
            business_id: business_id.into(),
            entity_name: entity_name.into(),
            onboarding_id: None,
            stage_id: None,
            before_snapshot: None,
            after_snapshot: None,
            related_entity_name: None,
            reason: None,
            operator: None,
            extended_data: None,
            ip_address: None,
            user_agent: None,
            source: None,
            status: OperationStatus::Success,
        }
    }

    /// Attaches the before and after entity snapshots as JSON text.
    #[must_use]
    pub fn with_snapshots(
        mut self,
        before: Option<impl Into<String>>,
        after: Option<impl Into<String>>,
    ) -> Self {
        self.before_snapshot = before.map(Into::into);
        self.after_snapshot = after.map(Into::into);
        self
    }

    /// Attaches the owning case.
    #[must_use]
    pub fn with_onboarding(mut self, onboarding_id: impl Into<String>) -> Self {
        self.onboarding_id = Some(onboarding_id.into());
        self
    }

    /// Attaches the owning stage.
    #[must_use]
    pub fn with_stage(mut self, stage_id: impl Into<String>) -> Self {
        self.stage_id = Some(stage_id.into());
        self
    }

    /// Attaches the display name of a related entity, such as the owning
    /// workflow.
    #[must_use]
    pub fn with_related_name(mut self, name: impl Into<String>) -> Self {
        self.related_entity_name = Some(name.into());
        self
    }

    /// Attaches an operator-supplied reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Overrides the ambient operator.
    #[must_use]
    pub fn with_operator(mut self, operator: OperatorIdentity) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Attaches a producer-defined JSON payload.
    #[must_use]
    pub fn with_extended_data(mut self, data: &serde_json::Value) -> Self {
        self.extended_data = Some(data.to_string());
        self
    }

    /// Attaches the HTTP client context the operation arrived with.
    #[must_use]
    pub fn with_client_context(
        mut self,
        ip_address: Option<impl Into<String>>,
        user_agent: Option<impl Into<String>>,
        source: Option<impl Into<String>>,
    ) -> Self {
        self.ip_address = ip_address.map(Into::into);
        self.user_agent = user_agent.map(Into::into);
        self.source = source.map(Into::into);
        self
    }

    /// Marks the audited operation as failed.
    #[must_use]
    pub fn with_status(mut self, status: OperationStatus) -> Self {
        self.status = status;
        self
    }
}

/// Records operations as change records and invalidates affected cache
/// entries.
///
/// Writing never fails the caller's operation: every error path logs and
/// returns `false`.
#[derive(Clone)]
pub struct ChangeLogWriter {
    repository: Arc<dyn ChangeLogRepository>,
    cache: LogCacheService,
    descriptions: DescriptionBuilder,
    operator_context: Arc<dyn OperatorContext>,
}

impl ChangeLogWriter {
    /// Creates a writer over the given repository and cache.
    #[must_use]
    pub fn new(
        repository: Arc<dyn ChangeLogRepository>,
        cache: LogCacheService,
        descriptions: DescriptionBuilder,
        operator_context: Arc<dyn OperatorContext>,
    ) -> Self {
        Self {
            repository,
            cache,
            descriptions,
            operator_context,
        }
    }

    /// Records one operation.
    ///
    /// Returns whether a record was persisted. Suppressed no-op updates
    /// return `true`; they are not an error.
    pub async fn log_operation(&self, input: LogOperationInput) -> bool {
        let operator = input
            .operator
            .clone()
            .or_else(|| self.operator_context.current_operator())
            .unwrap_or_else(OperatorIdentity::system);

        let changed_fields = derived_changed_fields(&input);
        if is_noop_update(&input, changed_fields.as_deref()) {
            debug!(
                module = %input.business_module,
                business_id = %input.business_id,
                "suppressing update with no detected changes"
            );
            return true;
        }

        let description_input = DescriptionInput {
            module: input.business_module,
            operation: input.operation_type,
            entity_name: &input.entity_name,
            operator_name: operator.display_name(),
            tenant_id: operator.tenant_id(),
            before_snapshot: input.before_snapshot.as_deref(),
            after_snapshot: input.after_snapshot.as_deref(),
            changed_fields: changed_fields.as_deref(),
            related_entity_name: input.related_entity_name.as_deref(),
            reason: input.reason.as_deref(),
        };
        let description = self.descriptions.build(&description_input).await;

        let mut record = ChangeRecord {
            id: Uuid::new_v4(),
            operation_type: input.operation_type,
            business_module: input.business_module,
            business_id: input.business_id.clone(),
            onboarding_id: input.onboarding_id.clone(),
            stage_id: input.stage_id.clone(),
            status: input.status,
            title: format!(
                "{} {}",
                input.business_module.display_name(),
                input.operation_type.title_word()
            ),
            description,
            before_snapshot: input.before_snapshot.clone(),
            after_snapshot: input.after_snapshot.clone(),
            changed_fields: stored_changed_fields(&input, changed_fields),
            extended_data: Some(
                input
                    .extended_data
                    .clone()
                    .unwrap_or_else(|| default_extended_data(&input)),
            ),
            operator_id: operator.operator_id().to_owned(),
            operator_name: operator.display_name().to_owned(),
            tenant_id: operator.tenant_id().clone(),
            app_code: operator.app_code().map(str::to_owned),
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            source: input.source.clone(),
            operation_time: Utc::now(),
        };

        if !self.insert_with_retry(&mut record).await {
            return false;
        }

        self.invalidate(&input).await;
        info!(
            record_id = %record.id,
            module = %input.business_module,
            operation = %input.operation_type,
            business_id = %input.business_id,
            "change record written"
        );
        true
    }

    // Id conflicts get a fresh id and a short backoff; anything else is
    // final.
    async fn insert_with_retry(&self, record: &mut ChangeRecord) -> bool {
        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            match self.repository.insert(record).await {
                Ok(()) => return true,
                Err(AppError::Conflict(message)) if attempt < MAX_INSERT_ATTEMPTS => {
                    debug!(
                        record_id = %record.id,
                        attempt,
                        %message,
                        "id conflict on insert, retrying with a fresh id"
                    );
                    record.regenerate_id();
                    tokio::time::sleep(Duration::from_millis(u64::from(attempt) * 10)).await;
                }
                Err(error) => {
                    error!(record_id = %record.id, %error, "failed to insert change record");
                    return false;
                }
            }
        }

        false
    }

    async fn invalidate(&self, input: &LogOperationInput) {
        self.cache
            .invalidate_for_business(input.business_module, &input.business_id)
            .await;
        if let Some(onboarding_id) = &input.onboarding_id {
            self.cache.invalidate_for_onboarding(onboarding_id).await;
        }
        if let Some(stage_id) = &input.stage_id {
            self.cache.invalidate_for_stage(stage_id).await;
        }
    }
}

fn derived_changed_fields(input: &LogOperationInput) -> Option<Vec<String>> {
    if input.operation_type != OperationType::Update {
        return None;
    }

    let before = Snapshot::parse(input.before_snapshot.as_deref()?)?;
    let after = Snapshot::parse(input.after_snapshot.as_deref()?)?;
    Some(changed_field_names(&before, &after))
}

// An update whose snapshots are equivalent, or whose snapshots parse but
// differ in no field, records nothing.
fn is_noop_update(input: &LogOperationInput, changed_fields: Option<&[String]>) -> bool {
    if input.operation_type != OperationType::Update {
        return false;
    }

    if input.before_snapshot.is_some()
        && is_equivalent(input.before_snapshot.as_deref(), input.after_snapshot.as_deref())
    {
        return true;
    }

    matches!(changed_fields, Some(fields) if fields.is_empty())
}

// Case records intentionally store an empty list: their snapshots carry
// permission payloads whose field names are not useful to consumers.
fn stored_changed_fields(
    input: &LogOperationInput,
    derived: Option<Vec<String>>,
) -> Option<Vec<String>> {
    if input.business_module == BusinessModule::Onboarding
        && input.operation_type == OperationType::Update
    {
        return Some(Vec::new());
    }

    derived
}

fn default_extended_data(input: &LogOperationInput) -> String {
    let module = input.business_module.display_name().replace(' ', "");
    let mut data = serde_json::Map::new();
    data.insert(format!("{module}Id"), json!(input.business_id));
    data.insert(format!("{module}Name"), json!(input.entity_name));
    data.insert(
        format!("{}At", input.operation_type.title_word()),
        json!(Utc::now().to_rfc3339()),
    );
    serde_json::Value::Object(data).to_string()
}
