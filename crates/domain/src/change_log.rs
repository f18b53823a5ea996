use std::fmt::{Display, Formatter};

use flowtrail_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// The operation an audited change performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Entity created.
    Create,
    /// Entity fields updated.
    Update,
    /// Entity deleted.
    Delete,
    /// Entity published to consumers.
    Publish,
    /// Entity withdrawn from consumers.
    Unpublish,
    /// Entity switched on.
    Activate,
    /// Entity switched off.
    Deactivate,
    /// Case lifecycle started.
    Start,
    /// Case lifecycle paused.
    Pause,
    /// Case lifecycle resumed.
    Resume,
    /// Case lifecycle aborted.
    Abort,
    /// Closed case brought back.
    Reactivate,
    /// Case completed regardless of outstanding work.
    ForceComplete,
    /// Display order rearranged.
    OrderChange,
    /// Automated action ran against the entity.
    ActionExecution,
}

impl OperationType {
    /// Stable value stored in records and cache keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Abort => "abort",
            Self::Reactivate => "reactivate",
            Self::ForceComplete => "force_complete",
            Self::OrderChange => "order_change",
            Self::ActionExecution => "action_execution",
        }
    }

    /// Past-tense phrase used in rendered descriptions.
    #[must_use]
    pub fn past_phrase(&self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
            Self::Publish => "published",
            Self::Unpublish => "unpublished",
            Self::Activate => "activated",
            Self::Deactivate => "deactivated",
            Self::Start => "started",
            Self::Pause => "paused",
            Self::Resume => "resumed",
            Self::Abort => "aborted",
            Self::Reactivate => "reactivated",
            Self::ForceComplete => "force completed",
            Self::OrderChange => "reordered",
            Self::ActionExecution => "executed",
        }
    }

    /// Capitalized word used in record titles.
    #[must_use]
    pub fn title_word(&self) -> &'static str {
        match self {
            Self::Create => "Created",
            Self::Update => "Updated",
            Self::Delete => "Deleted",
            Self::Publish => "Published",
            Self::Unpublish => "Unpublished",
            Self::Activate => "Activated",
            Self::Deactivate => "Deactivated",
            Self::Start => "Started",
            Self::Pause => "Paused",
            Self::Resume => "Resumed",
            Self::Abort => "Aborted",
            Self::Reactivate => "Reactivated",
            Self::ForceComplete => "Force Completed",
            Self::OrderChange => "Reordered",
            Self::ActionExecution => "Executed",
        }
    }

    /// Parses a stored value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "publish" => Ok(Self::Publish),
            "unpublish" => Ok(Self::Unpublish),
            "activate" => Ok(Self::Activate),
            "deactivate" => Ok(Self::Deactivate),
            "start" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "abort" => Ok(Self::Abort),
            "reactivate" => Ok(Self::Reactivate),
            "force_complete" => Ok(Self::ForceComplete),
            "order_change" => Ok(Self::OrderChange),
            "action_execution" => Ok(Self::ActionExecution),
            other => Err(AppError::Validation(format!(
                "unknown operation type '{other}'"
            ))),
        }
    }
}

impl Display for OperationType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// The kind of entity a change record is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessModule {
    /// Workflow definition.
    Workflow,
    /// Stage within a workflow.
    Stage,
    /// Checklist definition.
    Checklist,
    /// Task within a checklist.
    ChecklistTask,
    /// Questionnaire definition.
    Questionnaire,
    /// Submitted questionnaire answers.
    QuestionnaireAnswer,
    /// Single question within a questionnaire.
    Question,
    /// Static form field.
    StaticField,
    /// Uploaded file.
    File,
    /// Customer case moving through a workflow.
    Onboarding,
    /// Automated action definition.
    Action,
    /// Binding of an action to a trigger.
    ActionMapping,
}

impl BusinessModule {
    /// Every module, in stable order. Used for cache sweeps that must touch
    /// all module partitions.
    pub const ALL: [Self; 12] = [
        Self::Workflow,
        Self::Stage,
        Self::Checklist,
        Self::ChecklistTask,
        Self::Questionnaire,
        Self::QuestionnaireAnswer,
        Self::Question,
        Self::StaticField,
        Self::File,
        Self::Onboarding,
        Self::Action,
        Self::ActionMapping,
    ];

    /// Stable value stored in records and cache keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::Stage => "stage",
            Self::Checklist => "checklist",
            Self::ChecklistTask => "checklist_task",
            Self::Questionnaire => "questionnaire",
            Self::QuestionnaireAnswer => "questionnaire_answer",
            Self::Question => "question",
            Self::StaticField => "static_field",
            Self::File => "file",
            Self::Onboarding => "onboarding",
            Self::Action => "action",
            Self::ActionMapping => "action_mapping",
        }
    }

    /// Display name used in rendered descriptions.
    ///
    /// A few modules read differently in prose than in storage: cases are
    /// shown to users as "Case", checklist tasks as "Task".
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Workflow => "Workflow",
            Self::Stage => "Stage",
            Self::Checklist => "Checklist",
            Self::ChecklistTask => "Task",
            Self::Questionnaire => "Questionnaire",
            Self::QuestionnaireAnswer => "Questionnaire Answer",
            Self::Question => "Question",
            Self::StaticField => "Static Field",
            Self::File => "File",
            Self::Onboarding => "Case",
            Self::Action => "Action",
            Self::ActionMapping => "Action Mapping",
        }
    }

    /// Parses a stored value.
    pub fn parse(value: &str) -> AppResult<Self> {
        Self::ALL
            .iter()
            .find(|module| module.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown business module '{value}'")))
    }
}

impl Display for BusinessModule {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// Outcome recorded for the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// The operation completed.
    Success,
    /// The operation failed; the record documents the attempt.
    Failure,
}

impl OperationStatus {
    /// Stable value stored in records.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    /// Parses a stored value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(AppError::Validation(format!(
                "unknown operation status '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BusinessModule, OperationStatus, OperationType};

    #[test]
    fn operation_types_round_trip_through_storage_values() {
        for operation in [
            OperationType::Create,
            OperationType::ForceComplete,
            OperationType::ActionExecution,
        ] {
            let parsed = OperationType::parse(operation.as_str());
            assert!(parsed.is_ok());
        }
        assert!(OperationType::parse("explode").is_err());
    }

    #[test]
    fn module_display_names_diverge_from_storage_where_expected() {
        assert_eq!(BusinessModule::Onboarding.display_name(), "Case");
        assert_eq!(BusinessModule::ChecklistTask.display_name(), "Task");
        assert_eq!(BusinessModule::Onboarding.as_str(), "onboarding");
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        assert!(OperationStatus::parse("success").is_ok());
        assert!(OperationStatus::parse("partial").is_err());
    }
}
