use flowtrail_core::TenantId;
use flowtrail_domain::{
    ChangeFact, ListDeltaKind, Snapshot, diff_components, diff_questionnaire_structure,
    is_equivalent, normalize, parse_id_list, truncate_display,
};
use serde_json::Value;
use tracing::warn;

use super::{
    DescriptionBuilder, DescriptionInput, NAME_DISPLAY_LIMIT, VALUE_DISPLAY_LIMIT, humanize_label,
    render_fact,
};

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    PermissionMode,
    SubjectType,
    YesNo,
    DefaultFlag,
    TeamList(ListDeltaKind),
    UserList(ListDeltaKind),
    Assignees,
    TeamName,
    Structure,
    Components,
    Name,
    Plain,
}

// Exact-name dispatch, matched case-insensitively. Unlisted fields render
// generically.
const FIELD_RULES: &[(&[&str], FieldKind)] = &[
    (
        &["viewpermissionmode", "operatepermissionmode", "permissionmode"],
        FieldKind::PermissionMode,
    ),
    (
        &["viewpermissionsubjecttype", "operatepermissionsubjecttype"],
        FieldKind::SubjectType,
    ),
    (
        &[
            "isactive",
            "isenabled",
            "isrequired",
            "visibleinportal",
            "attachmentmanagementneeded",
        ],
        FieldKind::YesNo,
    ),
    (&["isdefault"], FieldKind::DefaultFlag),
    (&["viewteams"], FieldKind::TeamList(ListDeltaKind::ViewTeams)),
    (
        &["operateteams"],
        FieldKind::TeamList(ListDeltaKind::OperateTeams),
    ),
    (&["viewusers"], FieldKind::UserList(ListDeltaKind::ViewUsers)),
    (
        &["operateusers"],
        FieldKind::UserList(ListDeltaKind::OperateUsers),
    ),
    (
        &["defaultassignee", "defaultassignees", "assignees"],
        FieldKind::Assignees,
    ),
    (&["team", "teamid"], FieldKind::TeamName),
    (&["structurejson", "structure"], FieldKind::Structure),
    (&["componentsjson", "components"], FieldKind::Components),
    (&["name", "title"], FieldKind::Name),
];

fn classify(name: &str) -> FieldKind {
    for (aliases, kind) in FIELD_RULES {
        if aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name)) {
            return *kind;
        }
    }

    FieldKind::Plain
}

impl DescriptionBuilder {
    pub(super) async fn render_field(
        &self,
        input: &DescriptionInput<'_>,
        name: &str,
        before: &Snapshot,
        after: &Snapshot,
    ) -> Vec<String> {
        let aliases = [name];
        let before_value = before.field(&aliases);
        let after_value = after.field(&aliases);
        let label = humanize_label(name);

        match classify(name) {
            FieldKind::PermissionMode => {
                scalar_clause(&label, before_value, after_value, permission_mode_display)
            }
            FieldKind::SubjectType => {
                scalar_clause(&label, before_value, after_value, subject_type_display)
            }
            FieldKind::YesNo => scalar_clause(&label, before_value, after_value, yes_no_display),
            FieldKind::DefaultFlag => {
                scalar_clause(&label, before_value, after_value, default_flag_display)
            }
            FieldKind::TeamList(kind) => {
                self.id_list_clauses(kind, before_value, after_value, input.tenant_id, true)
                    .await
            }
            FieldKind::UserList(kind) => {
                self.id_list_clauses(kind, before_value, after_value, input.tenant_id, false)
                    .await
            }
            FieldKind::Assignees => {
                self.id_list_clauses(
                    ListDeltaKind::Assignees,
                    before_value,
                    after_value,
                    input.tenant_id,
                    false,
                )
                .await
            }
            FieldKind::TeamName => {
                self.team_name_clause(&label, before_value, after_value, input.tenant_id)
                    .await
            }
            FieldKind::Structure => deep_clauses(
                before_value,
                after_value,
                diff_questionnaire_structure,
                "Structure modified",
            ),
            FieldKind::Components => {
                deep_clauses(before_value, after_value, diff_components, "Components modified")
            }
            FieldKind::Name => scalar_clause_with_limit(
                &label,
                before_value,
                after_value,
                NAME_DISPLAY_LIMIT,
                |raw| raw.to_owned(),
            ),
            FieldKind::Plain => scalar_clause_with_limit(
                &label,
                before_value,
                after_value,
                VALUE_DISPLAY_LIMIT,
                |raw| raw.to_owned(),
            ),
        }
    }

    async fn id_list_clauses(
        &self,
        kind: ListDeltaKind,
        before_value: Option<&Value>,
        after_value: Option<&Value>,
        tenant_id: &TenantId,
        teams: bool,
    ) -> Vec<String> {
        let before_ids = before_value.map(parse_id_list).unwrap_or_default();
        let after_ids = after_value.map(parse_id_list).unwrap_or_default();

        let added: Vec<String> = after_ids
            .iter()
            .filter(|id| !before_ids.contains(id))
            .cloned()
            .collect();
        let removed: Vec<String> = before_ids
            .iter()
            .filter(|id| !after_ids.contains(id))
            .cloned()
            .collect();

        if added.is_empty() && removed.is_empty() {
            return Vec::new();
        }

        let mut lookup: Vec<String> = added.clone();
        lookup.extend(removed.iter().cloned());
        let names = self.resolve_names(&lookup, tenant_id, teams).await;
        let display =
            |id: &String| -> String { names.get(id).cloned().unwrap_or_else(|| id.clone()) };

        render_fact(&ChangeFact::ListDelta {
            kind,
            scope: None,
            added: added.iter().map(display).collect(),
            removed: removed.iter().map(display).collect(),
        })
    }

    // Single team id fields render the team name, not the id.
    async fn team_name_clause(
        &self,
        label: &str,
        before_value: Option<&Value>,
        after_value: Option<&Value>,
        tenant_id: &TenantId,
    ) -> Vec<String> {
        let before_raw = display_text(before_value);
        let after_raw = display_text(after_value);
        if is_equivalent(before_raw.as_deref(), after_raw.as_deref()) {
            return Vec::new();
        }

        let ids: Vec<String> = [before_raw.clone(), after_raw.clone()]
            .into_iter()
            .flatten()
            .filter(|id| !id.trim().is_empty())
            .collect();
        let names = self.resolve_names(&ids, tenant_id, true).await;
        let shown = |raw: &Option<String>| -> String {
            raw.as_deref()
                .map(|id| names.get(id).cloned().unwrap_or_else(|| id.to_owned()))
                .unwrap_or_default()
        };

        vec![format!(
            "{label} from '{}' to '{}'",
            truncate_display(&shown(&before_raw), VALUE_DISPLAY_LIMIT),
            truncate_display(&shown(&after_raw), VALUE_DISPLAY_LIMIT)
        )]
    }

    async fn resolve_names(
        &self,
        ids: &[String],
        tenant_id: &TenantId,
        teams: bool,
    ) -> std::collections::HashMap<String, String> {
        let result = if teams {
            self.name_resolver.resolve_team_names(ids, tenant_id).await
        } else {
            self.name_resolver.resolve_user_names(ids, tenant_id).await
        };

        match result {
            Ok(names) => names,
            Err(error) => {
                warn!(%error, "name resolution failed, falling back to raw ids");
                std::collections::HashMap::new()
            }
        }
    }
}

pub(super) fn permission_mode_display(raw: &str) -> String {
    match normalize(raw).to_lowercase().as_str() {
        "1" | "public" => "Public".to_owned(),
        "2" | "visibletoteams" => "Visible to Teams".to_owned(),
        "3" | "invisibletoteams" => "Invisible to Teams".to_owned(),
        "4" | "private" => "Private".to_owned(),
        _ => raw.to_owned(),
    }
}

pub(super) fn subject_type_display(raw: &str) -> String {
    match normalize(raw).as_str() {
        "1" => "Team".to_owned(),
        "2" => "User".to_owned(),
        _ => raw.to_owned(),
    }
}

pub(super) fn yes_no_display(raw: &str) -> String {
    let normalized = normalize(raw);
    if normalized == "true" || normalized == "1" {
        "Yes".to_owned()
    } else {
        "No".to_owned()
    }
}

fn default_flag_display(raw: &str) -> String {
    let normalized = normalize(raw);
    if normalized == "true" || normalized == "1" {
        "Default".to_owned()
    } else {
        "Not Default".to_owned()
    }
}

fn scalar_clause(
    label: &str,
    before_value: Option<&Value>,
    after_value: Option<&Value>,
    display: fn(&str) -> String,
) -> Vec<String> {
    scalar_clause_with_limit(label, before_value, after_value, VALUE_DISPLAY_LIMIT, display)
}

fn scalar_clause_with_limit(
    label: &str,
    before_value: Option<&Value>,
    after_value: Option<&Value>,
    limit: usize,
    display: fn(&str) -> String,
) -> Vec<String> {
    let before_raw = display_text(before_value);
    let after_raw = display_text(after_value);

    if is_equivalent(before_raw.as_deref(), after_raw.as_deref()) {
        return Vec::new();
    }

    let before_shown = display(before_raw.as_deref().unwrap_or_default());
    let after_shown = display(after_raw.as_deref().unwrap_or_default());
    if before_shown == after_shown {
        return Vec::new();
    }

    vec![format!(
        "{label} from '{}' to '{}'",
        truncate_display(&before_shown, limit),
        truncate_display(&after_shown, limit)
    )]
}

fn deep_clauses(
    before_value: Option<&Value>,
    after_value: Option<&Value>,
    diff: fn(&str, &str) -> Option<Vec<ChangeFact>>,
    fallback: &str,
) -> Vec<String> {
    let before_raw = raw_json(before_value).unwrap_or_else(|| "{}".to_owned());
    let after_raw = raw_json(after_value).unwrap_or_else(|| "{}".to_owned());

    match diff(&before_raw, &after_raw) {
        Some(facts) => facts.iter().flat_map(render_fact).collect(),
        None => vec![fallback.to_owned()],
    }
}

// Payload fields sometimes hold JSON text and sometimes hold the structure
// itself.
fn raw_json(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn display_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(value) => Some(flowtrail_domain::display_string(value)),
    }
}
