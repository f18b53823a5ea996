use serde_json::{Map, Value};

use crate::change_fact::{ChangeFact, ListDeltaKind};
use crate::document::{Snapshot, display_string, lookup_ci, parse_id_list};
use crate::normalize::is_equivalent;

/// Diffs two stage component lists.
///
/// Components are grouped by their type key and matched within a group by
/// the identifiers they bind (checklist ids, questionnaire ids, field
/// names), never by array position. Added and removed bindings are reported
/// individually; enable/disable and order changes are reported per matched
/// component. When nothing can be named the diff degrades to a count delta.
///
/// Returns `None` when either payload fails to parse.
#[must_use]
pub fn diff_components(before_json: &str, after_json: &str) -> Option<Vec<ChangeFact>> {
    let before = component_groups(before_json)?;
    let after = component_groups(after_json)?;

    let mut facts = Vec::new();

    for group in &after {
        let previous = before.iter().find(|other| other.key == group.key);
        match previous {
            None => {
                if group.member_labels.is_empty() {
                    facts.push(ChangeFact::Remark(format!(
                        "{} component added",
                        group.display
                    )));
                } else {
                    facts.push(ChangeFact::ListDelta {
                        kind: group.list_kind,
                        scope: None,
                        added: group.member_labels.clone(),
                        removed: Vec::new(),
                    });
                }
            }
            Some(previous) => diff_group(previous, group, &mut facts),
        }
    }

    for group in &before {
        if after.iter().any(|other| other.key == group.key) {
            continue;
        }
        if group.member_labels.is_empty() {
            facts.push(ChangeFact::Remark(format!(
                "{} component removed",
                group.display
            )));
        } else {
            facts.push(ChangeFact::ListDelta {
                kind: group.list_kind,
                scope: None,
                added: Vec::new(),
                removed: group.member_labels.clone(),
            });
        }
    }

    if facts.is_empty() && before.len() != after.len() {
        facts.push(ChangeFact::CountDelta {
            label: "components".to_owned(),
            before: before.len(),
            after: after.len(),
        });
    }

    Some(facts)
}

struct ComponentGroup {
    key: String,
    display: String,
    list_kind: ListDeltaKind,
    member_keys: Vec<String>,
    member_labels: Vec<String>,
    enabled: Option<String>,
    order: Option<String>,
}

fn component_groups(payload: &str) -> Option<Vec<ComponentGroup>> {
    let snapshot = Snapshot::parse(payload)?;

    let elements: Vec<&Map<String, Value>> = if let Some(array) = snapshot.as_array() {
        array.iter().filter_map(Value::as_object).collect()
    } else if let Some(array) = snapshot.field(&["components"]).and_then(Value::as_array) {
        array.iter().filter_map(Value::as_object).collect()
    } else {
        return None;
    };

    let mut groups: Vec<ComponentGroup> = Vec::new();

    for element in elements {
        let key = lookup_ci(element, &["key", "type"])
            .map(display_string)
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if key.is_empty() {
            continue;
        }

        let (ids, labels) = members_of(element, &key);

        // Repeated entries with the same type key merge into one group.
        if let Some(group) = groups.iter_mut().find(|group| group.key == key) {
            for (id, label) in ids.into_iter().zip(labels) {
                if !group.member_keys.contains(&id) {
                    group.member_keys.push(id);
                    group.member_labels.push(label);
                }
            }
            continue;
        }

        groups.push(ComponentGroup {
            display: display_of(&key),
            list_kind: list_kind_of(&key),
            member_keys: ids,
            member_labels: labels,
            enabled: lookup_ci(element, &["isEnabled", "enabled"]).map(display_string),
            order: lookup_ci(element, &["order", "sortOrder"]).map(display_string),
            key,
        });
    }

    Some(groups)
}

fn members_of(element: &Map<String, Value>, key: &str) -> (Vec<String>, Vec<String>) {
    let (id_aliases, name_aliases): (&[&str], &[&str]) = match key {
        "checklist" => (&["checklistIds"], &["checklistNames"]),
        "questionnaires" | "questionnaire" => (&["questionnaireIds"], &["questionnaireNames"]),
        "fields" => (&["staticFields", "fieldIds"], &["fieldNames"]),
        _ => (&[], &[]),
    };

    let ids = lookup_ci(element, id_aliases)
        .map(parse_id_list)
        .unwrap_or_default();
    let names = lookup_ci(element, name_aliases)
        .map(parse_id_list)
        .unwrap_or_default();

    // Names align with ids positionally when the producer included them.
    let labels = if names.len() == ids.len() && !ids.is_empty() {
        names
    } else {
        ids.clone()
    };

    (ids, labels)
}

fn diff_group(previous: &ComponentGroup, current: &ComponentGroup, facts: &mut Vec<ChangeFact>) {
    let added: Vec<String> = current
        .member_keys
        .iter()
        .zip(&current.member_labels)
        .filter(|(id, _)| !previous.member_keys.contains(id))
        .map(|(_, label)| label.clone())
        .collect();
    let removed: Vec<String> = previous
        .member_keys
        .iter()
        .zip(&previous.member_labels)
        .filter(|(id, _)| !current.member_keys.contains(id))
        .map(|(_, label)| label.clone())
        .collect();

    if !added.is_empty() || !removed.is_empty() {
        facts.push(ChangeFact::ListDelta {
            kind: current.list_kind,
            scope: None,
            added,
            removed,
        });
    }

    if !is_equivalent(previous.enabled.as_deref(), current.enabled.as_deref()) {
        let enabled = current
            .enabled
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        facts.push(ChangeFact::Remark(format!(
            "{} component {}",
            current.display,
            if enabled { "enabled" } else { "disabled" }
        )));
    }

    if !is_equivalent(previous.order.as_deref(), current.order.as_deref()) {
        facts.push(ChangeFact::FieldModified {
            name: format!("{} component order", current.display),
            before: previous.order.clone().unwrap_or_default(),
            after: current.order.clone().unwrap_or_default(),
        });
    }
}

fn display_of(key: &str) -> String {
    match key {
        "checklist" => "Checklist".to_owned(),
        "questionnaires" | "questionnaire" => "Questionnaire".to_owned(),
        "fields" => "Fields".to_owned(),
        "files" => "Files".to_owned(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

fn list_kind_of(key: &str) -> ListDeltaKind {
    match key {
        "checklist" => ListDeltaKind::Checklists,
        "questionnaires" | "questionnaire" => ListDeltaKind::Questionnaires,
        _ => ListDeltaKind::Fields,
    }
}

#[cfg(test)]
mod tests {
    use super::diff_components;
    use crate::change_fact::{ChangeFact, ListDeltaKind};

    #[test]
    fn added_checklist_binding_reports_only_the_new_member() {
        let before = r#"[{"key": "checklist", "checklistIds": ["1"], "checklistNames": ["KYC"], "order": 1, "isEnabled": true}]"#;
        let after = r#"[{"key": "checklist", "checklistIds": ["1", "2"], "checklistNames": ["KYC", "Legal Review"], "order": 1, "isEnabled": true}]"#;

        let facts = diff_components(before, after).unwrap_or_default();

        assert_eq!(facts.len(), 1);
        assert!(matches!(
            &facts[0],
            ChangeFact::ListDelta { kind: ListDeltaKind::Checklists, added, removed, .. }
                if added == &vec!["Legal Review".to_owned()] && removed.is_empty()
        ));
    }

    #[test]
    fn matching_ignores_array_position() {
        let before = r#"[{"key": "checklist", "checklistIds": ["1", "2"]},
                         {"key": "questionnaires", "questionnaireIds": ["9"]}]"#;
        let after = r#"[{"key": "questionnaires", "questionnaireIds": ["9"]},
                        {"key": "checklist", "checklistIds": ["2", "1"]}]"#;

        let facts = diff_components(before, after);
        assert_eq!(facts, Some(Vec::new()));
    }

    #[test]
    fn enable_and_order_changes_are_detected_independently() {
        let before = r#"[{"key": "fields", "staticFields": ["email"], "isEnabled": true, "order": 1}]"#;
        let after = r#"[{"key": "fields", "staticFields": ["email"], "isEnabled": false, "order": 3}]"#;

        let facts = diff_components(before, after).unwrap_or_default();

        assert_eq!(facts.len(), 2);
        assert!(matches!(
            &facts[0],
            ChangeFact::Remark(text) if text == "Fields component disabled"
        ));
        assert!(matches!(
            &facts[1],
            ChangeFact::FieldModified { before, after, .. } if before == "1" && after == "3"
        ));
    }

    #[test]
    fn memberless_group_removal_reports_a_remark() {
        let before = r#"[{"key": "files"}, {"key": "quicklink"}]"#;
        let after = r#"[{"key": "files"}]"#;

        let facts = diff_components(before, after).unwrap_or_default();

        assert_eq!(facts.len(), 1);
        assert!(matches!(
            &facts[0],
            ChangeFact::Remark(text) if text == "Quicklink component removed"
        ));
    }

    #[test]
    fn wrapper_object_payload_is_accepted() {
        let before = r#"{"components": [{"key": "checklist", "checklistIds": ["1"]}]}"#;
        let after = r#"{"components": [{"key": "checklist", "checklistIds": []}]}"#;

        let facts = diff_components(before, after).unwrap_or_default();

        assert_eq!(facts.len(), 1);
        assert!(matches!(
            &facts[0],
            ChangeFact::ListDelta { removed, .. } if removed == &vec!["1".to_owned()]
        ));
    }

    #[test]
    fn unparseable_payload_yields_none() {
        assert!(diff_components("nope", "[]").is_none());
    }
}
