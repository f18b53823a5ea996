use std::sync::Arc;

use flowtrail_core::TenantId;
use flowtrail_domain::{
    BusinessModule, ChangeFact, OperationType, Snapshot, changed_field_names, truncate_display,
};
use tracing::debug;

use crate::log_ports::NameResolver;

mod create_summary;
mod renderers;


const VALUE_DISPLAY_LIMIT: usize = 50;
const NAME_DISPLAY_LIMIT: usize = 200;
const MAX_RENDERED_FIELDS: usize = 3;

// Bookkeeping columns that never belong in rendered prose.
const IGNORED_FIELDS: &[&str] = &[
    "id",
    "tenantid",
    "appcode",
    "createdate",
    "createby",
    "createuserid",
    "modifydate",
    "modifyby",
    "modifyuserid",
    "isvalid",
];

// Checklist descriptions surface only the fields operators actually edit.
const CHECKLIST_ALLOWED_FIELDS: &[&str] = &["name", "description", "team", "teamid", "teamname"];

/// Everything needed to render one operation description.
#[derive(Debug, Clone, Copy)]
pub struct DescriptionInput<'a> {
    /// Entity kind the operation targeted.
    pub module: BusinessModule,
    /// What was done.
    pub operation: OperationType,
    /// Display name of the entity.
    pub entity_name: &'a str,
    /// Display name of the operator.
    pub operator_name: &'a str,
    /// Tenant used for directory lookups.
    pub tenant_id: &'a TenantId,
    /// Snapshot before the operation, as JSON text.
    pub before_snapshot: Option<&'a str>,
    /// Snapshot after the operation, as JSON text.
    pub after_snapshot: Option<&'a str>,
    /// Pre-computed changed field names; detected from the snapshots when
    /// absent.
    pub changed_fields: Option<&'a [String]>,
    /// Display name of a related entity, such as the owning workflow.
    pub related_entity_name: Option<&'a str>,
    /// Operator-supplied reason for the operation.
    pub reason: Option<&'a str>,
}

/// Renders operation descriptions.
///
/// Rendering never fails: unparseable snapshots and failed directory
/// lookups degrade to the base sentence or to raw ids.
#[derive(Clone)]
pub struct DescriptionBuilder {
    name_resolver: Arc<dyn NameResolver>,
}

impl DescriptionBuilder {
    /// Creates a builder using the given directory for team and user names.
    #[must_use]
    pub fn new(name_resolver: Arc<dyn NameResolver>) -> Self {
        Self { name_resolver }
    }

    /// Builds the full description for one operation.
    pub async fn build(&self, input: &DescriptionInput<'_>) -> String {
        let mut description = format!(
            "{} '{}' has been {} by {}",
            input.module.display_name(),
            input.entity_name,
            input.operation.past_phrase(),
            input.operator_name
        );

        if let Some(related) = non_blank(input.related_entity_name) {
            description.push_str(&format!(" in '{related}'"));
        }

        if let Some(reason) = non_blank(input.reason) {
            if !suppresses_reason(input.module, input.operation) {
                description.push_str(&format!(" with reason: {reason}"));
            }
        }

        match input.operation {
            OperationType::Create => {
                if let Some(summary) = self.create_summary(input).await {
                    description.push_str(". Created with: ");
                    description.push_str(&summary);
                }
            }
            OperationType::Update => {
                if let Some(changes) = self.update_changes(input).await {
                    description.push_str(". Changes: ");
                    description.push_str(&changes);
                }
            }
            _ => {}
        }

        description
    }

    async fn update_changes(&self, input: &DescriptionInput<'_>) -> Option<String> {
        let before = parse_snapshot(input.before_snapshot?)?;
        let after = parse_snapshot(input.after_snapshot?)?;

        let mut names: Vec<String> = match input.changed_fields {
            Some(fields) if !fields.is_empty() => fields.to_vec(),
            _ => changed_field_names(&before, &after),
        };
        names.retain(|name| is_field_rendered(input.module, name));

        let mut rendered_fields: Vec<Vec<String>> = Vec::new();
        for name in &names {
            let clauses = self.render_field(input, name, &before, &after).await;
            if !clauses.is_empty() {
                rendered_fields.push(clauses);
            }
        }

        if rendered_fields.is_empty() {
            return None;
        }

        // The overflow cap counts fields, not clauses; case records render
        // every field.
        let exempt = input.module == BusinessModule::Onboarding;
        let overflow = if exempt {
            0
        } else {
            rendered_fields.len().saturating_sub(MAX_RENDERED_FIELDS)
        };

        let shown = if overflow > 0 {
            &rendered_fields[..MAX_RENDERED_FIELDS]
        } else {
            &rendered_fields[..]
        };
        let mut clauses: Vec<String> = shown.iter().flatten().cloned().collect();
        if overflow > 0 {
            clauses.push(format!("and {overflow} more fields"));
        }

        Some(clauses.join(", "))
    }
}

/// Renders one change fact into description clauses.
#[must_use]
pub fn render_fact(fact: &ChangeFact) -> Vec<String> {
    match fact {
        ChangeFact::FieldModified {
            name,
            before,
            after,
        } => vec![format!(
            "{name} from '{}' to '{}'",
            truncate_display(before, VALUE_DISPLAY_LIMIT),
            truncate_display(after, VALUE_DISPLAY_LIMIT)
        )],
        ChangeFact::FieldAdded { name, value } => vec![format!(
            "added {name} '{}'",
            truncate_display(value, VALUE_DISPLAY_LIMIT)
        )],
        ChangeFact::FieldRemoved { name, value } => vec![format!(
            "removed {name} '{}'",
            truncate_display(value, VALUE_DISPLAY_LIMIT)
        )],
        ChangeFact::ListDelta {
            kind,
            scope,
            added,
            removed,
        } => {
            let target = match scope {
                Some(scope) => format!("{} of question '{scope}'", kind.display_name()),
                None => kind.display_name().to_owned(),
            };

            let mut clauses = Vec::new();
            if !added.is_empty() {
                clauses.push(format!("added {} to {target}", added.join(", ")));
            }
            if !removed.is_empty() {
                if kind.summarizes_removals() {
                    clauses.push(format!(
                        "removed {} {}(s) from {target}",
                        removed.len(),
                        kind.member_noun()
                    ));
                } else {
                    clauses.push(format!("removed {} from {target}", removed.join(", ")));
                }
            }
            clauses
        }
        ChangeFact::CountDelta {
            label,
            before,
            after,
        } => vec![format!("{label} count from {before} to {after}")],
        ChangeFact::Remark(text) => vec![text.clone()],
    }
}

/// Turns a raw property name into a display label: `viewTeams` becomes
/// `View Teams`.
#[must_use]
pub fn humanize_label(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && current.chars().last().is_some_and(char::is_lowercase) {
            words.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .into_iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_snapshot(text: &str) -> Option<Snapshot> {
    let snapshot = Snapshot::parse(text);
    if snapshot.is_none() {
        debug!("snapshot text is not JSON, skipping field rendering");
    }
    snapshot
}

fn is_field_rendered(module: BusinessModule, name: &str) -> bool {
    if IGNORED_FIELDS.iter().any(|field| field.eq_ignore_ascii_case(name)) {
        return false;
    }

    match module {
        // The workflow active flag flips during publish housekeeping and is
        // not an operator-visible edit.
        BusinessModule::Workflow => !name.eq_ignore_ascii_case("isactive"),
        BusinessModule::Checklist => CHECKLIST_ALLOWED_FIELDS
            .iter()
            .any(|field| field.eq_ignore_ascii_case(name)),
        _ => true,
    }
}

fn suppresses_reason(module: BusinessModule, operation: OperationType) -> bool {
    module == BusinessModule::ChecklistTask && operation == OperationType::Delete
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}
