use flowtrail_domain::{Snapshot, display_string, parse_id_list, truncate_display};
use serde_json::Value;

use super::renderers::{permission_mode_display, yes_no_display};
use super::{DescriptionBuilder, DescriptionInput};

const SUMMARY_TEXT_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy)]
enum SummaryStyle {
    /// Plain scalar value.
    Text,
    /// Longer free text, truncated harder.
    LongText,
    /// Boolean rendered as Yes/No.
    YesNo,
    /// Permission mode enum rendered by display name.
    PermissionMode,
    /// Team id list resolved to names.
    TeamNames,
    /// User id list resolved to names.
    UserNames,
    /// Component list summarized by component type.
    Components,
    /// Prefer a sibling display-name field over the raw id.
    NameOverId(&'static [&'static str]),
}

struct SummaryField {
    aliases: &'static [&'static str],
    label: &'static str,
    style: SummaryStyle,
}

// Per-module allow-lists of the fields worth echoing on create. Modules
// without an entry get the base sentence only.
fn summary_fields(module: flowtrail_domain::BusinessModule) -> &'static [SummaryField] {
    use flowtrail_domain::BusinessModule as Module;

    match module {
        Module::Workflow => &[
            SummaryField {
                aliases: &["description"],
                label: "Description",
                style: SummaryStyle::LongText,
            },
            SummaryField {
                aliases: &["isDefault"],
                label: "Default",
                style: SummaryStyle::YesNo,
            },
            SummaryField {
                aliases: &["status"],
                label: "Status",
                style: SummaryStyle::Text,
            },
            SummaryField {
                aliases: &["startDate"],
                label: "Start Date",
                style: SummaryStyle::Text,
            },
            SummaryField {
                aliases: &["endDate"],
                label: "End Date",
                style: SummaryStyle::Text,
            },
        ],
        Module::Stage => &[
            SummaryField {
                aliases: &["description"],
                label: "Description",
                style: SummaryStyle::LongText,
            },
            SummaryField {
                aliases: &["defaultAssignee", "defaultAssignees"],
                label: "Default Assignees",
                style: SummaryStyle::UserNames,
            },
            SummaryField {
                aliases: &["estimatedDuration"],
                label: "Estimated Duration",
                style: SummaryStyle::Text,
            },
            SummaryField {
                aliases: &["visibleInPortal"],
                label: "Visible in Portal",
                style: SummaryStyle::YesNo,
            },
            SummaryField {
                aliases: &["componentsJson", "components"],
                label: "Components",
                style: SummaryStyle::Components,
            },
        ],
        Module::Checklist => &[
            SummaryField {
                aliases: &["description"],
                label: "Description",
                style: SummaryStyle::LongText,
            },
            SummaryField {
                aliases: &["team", "teamId"],
                label: "Team",
                style: SummaryStyle::TeamNames,
            },
            SummaryField {
                aliases: &["type"],
                label: "Type",
                style: SummaryStyle::Text,
            },
        ],
        Module::ChecklistTask => &[
            SummaryField {
                aliases: &["description"],
                label: "Description",
                style: SummaryStyle::LongText,
            },
            SummaryField {
                aliases: &["priority"],
                label: "Priority",
                style: SummaryStyle::Text,
            },
            SummaryField {
                aliases: &["dueDate"],
                label: "Due Date",
                style: SummaryStyle::Text,
            },
            SummaryField {
                aliases: &["assigneeName", "assignedUser"],
                label: "Assignee",
                style: SummaryStyle::Text,
            },
        ],
        Module::Questionnaire => &[
            SummaryField {
                aliases: &["description"],
                label: "Description",
                style: SummaryStyle::LongText,
            },
            SummaryField {
                aliases: &["category"],
                label: "Category",
                style: SummaryStyle::Text,
            },
            SummaryField {
                aliases: &["isActive"],
                label: "Active",
                style: SummaryStyle::YesNo,
            },
        ],
        Module::Onboarding => &[
            SummaryField {
                aliases: &["priority"],
                label: "Priority",
                style: SummaryStyle::Text,
            },
            SummaryField {
                aliases: &["ownership", "ownershipId"],
                label: "Ownership",
                style: SummaryStyle::NameOverId(&["ownershipName"]),
            },
            SummaryField {
                aliases: &["workflowId"],
                label: "Workflow",
                style: SummaryStyle::NameOverId(&["workflowName"]),
            },
            SummaryField {
                aliases: &["viewPermissionMode"],
                label: "View Permission Mode",
                style: SummaryStyle::PermissionMode,
            },
            SummaryField {
                aliases: &["viewTeams"],
                label: "View Teams",
                style: SummaryStyle::TeamNames,
            },
            SummaryField {
                aliases: &["operateTeams"],
                label: "Operate Teams",
                style: SummaryStyle::TeamNames,
            },
            SummaryField {
                aliases: &["viewUsers"],
                label: "View Users",
                style: SummaryStyle::UserNames,
            },
            SummaryField {
                aliases: &["operateUsers"],
                label: "Operate Users",
                style: SummaryStyle::UserNames,
            },
        ],
        Module::Action => &[
            SummaryField {
                aliases: &["description"],
                label: "Description",
                style: SummaryStyle::LongText,
            },
            SummaryField {
                aliases: &["actionType", "type"],
                label: "Type",
                style: SummaryStyle::Text,
            },
            SummaryField {
                aliases: &["triggerType"],
                label: "Trigger",
                style: SummaryStyle::Text,
            },
        ],
        _ => &[],
    }
}

impl DescriptionBuilder {
    pub(super) async fn create_summary(&self, input: &DescriptionInput<'_>) -> Option<String> {
        let after = Snapshot::parse(input.after_snapshot?)?;

        let mut parts: Vec<String> = Vec::new();
        for field in summary_fields(input.module) {
            if let Some(value) = self.summary_value(&after, field, input).await {
                parts.push(format!("{}: {value}", field.label));
            }
        }

        (!parts.is_empty()).then(|| parts.join("; "))
    }

    async fn summary_value(
        &self,
        after: &Snapshot,
        field: &SummaryField,
        input: &DescriptionInput<'_>,
    ) -> Option<String> {
        let value = after.field(field.aliases);

        match field.style {
            SummaryStyle::Text => non_blank_text(value),
            SummaryStyle::LongText => {
                non_blank_text(value).map(|text| truncate_display(&text, SUMMARY_TEXT_LIMIT))
            }
            SummaryStyle::YesNo => non_blank_text(value).map(|text| yes_no_display(&text)),
            SummaryStyle::PermissionMode => {
                non_blank_text(value).map(|text| permission_mode_display(&text))
            }
            SummaryStyle::TeamNames => self.named_list(value, input, true).await,
            SummaryStyle::UserNames => self.named_list(value, input, false).await,
            SummaryStyle::Components => component_summary(value),
            SummaryStyle::NameOverId(name_aliases) => after
                .field_text(name_aliases)
                .filter(|name| !name.trim().is_empty())
                .or_else(|| non_blank_text(value)),
        }
    }

    // Empty lists are omitted rather than rendered as [].
    async fn named_list(
        &self,
        value: Option<&Value>,
        input: &DescriptionInput<'_>,
        teams: bool,
    ) -> Option<String> {
        let ids = value.map(parse_id_list).unwrap_or_default();
        if ids.is_empty() {
            return None;
        }

        let names = self.resolve_summary_names(&ids, input, teams).await;
        let labels: Vec<String> = ids
            .iter()
            .map(|id| names.get(id).cloned().unwrap_or_else(|| id.clone()))
            .collect();

        Some(labels.join(", "))
    }

    async fn resolve_summary_names(
        &self,
        ids: &[String],
        input: &DescriptionInput<'_>,
        teams: bool,
    ) -> std::collections::HashMap<String, String> {
        let result = if teams {
            self.name_resolver
                .resolve_team_names(ids, input.tenant_id)
                .await
        } else {
            self.name_resolver
                .resolve_user_names(ids, input.tenant_id)
                .await
        };

        result.unwrap_or_default()
    }
}

fn component_summary(value: Option<&Value>) -> Option<String> {
    let elements: Vec<&Value> = match value {
        Some(Value::Array(elements)) => elements.iter().collect(),
        Some(Value::String(text)) => {
            return component_summary_from_text(text);
        }
        _ => return None,
    };

    summarize_component_elements(&elements)
}

fn component_summary_from_text(text: &str) -> Option<String> {
    let parsed = serde_json::from_str::<Value>(text.trim()).ok()?;
    match &parsed {
        Value::Array(elements) => summarize_component_elements(&elements.iter().collect::<Vec<_>>()),
        _ => None,
    }
}

fn summarize_component_elements(elements: &[&Value]) -> Option<String> {
    let mut kinds: Vec<String> = Vec::new();
    for element in elements {
        let Some(map) = element.as_object() else {
            continue;
        };
        let Some(key) = flowtrail_domain::lookup_ci(map, &["key", "type"]) else {
            continue;
        };
        let key = display_string(key);
        if key.trim().is_empty() {
            continue;
        }

        let mut chars = key.trim().chars();
        let display = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => continue,
        };
        if !kinds.contains(&display) {
            kinds.push(display);
        }
    }

    (!kinds.is_empty()).then(|| kinds.join(", "))
}

fn non_blank_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(value) => {
            let text = display_string(value);
            (!text.trim().is_empty()).then_some(text)
        }
    }
}
