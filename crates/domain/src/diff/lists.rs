use serde_json::Value;

use crate::change_fact::{ChangeFact, ListDeltaKind};
use crate::document::{display_string, lookup_ci};
use crate::normalize::normalize;

/// Diffs two lists with set semantics.
///
/// Elements match by stable identity, not by array position: an object's
/// `id`, falling back to its `value`, falling back to its `label`. Scalar
/// elements use their own normalized value. Reordering alone produces no
/// fact; returns `None` when membership is unchanged.
#[must_use]
pub fn diff_value_lists(
    before: &[Value],
    after: &[Value],
    kind: ListDeltaKind,
    scope: Option<String>,
) -> Option<ChangeFact> {
    let before_members = members_of(before);
    let after_members = members_of(after);

    let added: Vec<String> = after_members
        .iter()
        .filter(|(key, _)| !before_members.iter().any(|(other, _)| other == key))
        .map(|(_, label)| label.clone())
        .collect();
    let removed: Vec<String> = before_members
        .iter()
        .filter(|(key, _)| !after_members.iter().any(|(other, _)| other == key))
        .map(|(_, label)| label.clone())
        .collect();

    if added.is_empty() && removed.is_empty() {
        return None;
    }

    Some(ChangeFact::ListDelta {
        kind,
        scope,
        added,
        removed,
    })
}

// (identity key, display label) per element, first occurrence wins.
fn members_of(elements: &[Value]) -> Vec<(String, String)> {
    let mut members: Vec<(String, String)> = Vec::new();

    for element in elements {
        let Some((key, label)) = identity_of(element) else {
            continue;
        };
        if !members.iter().any(|(existing, _)| *existing == key) {
            members.push((key, label));
        }
    }

    members
}

fn identity_of(element: &Value) -> Option<(String, String)> {
    match element {
        Value::Object(map) => {
            let id = lookup_ci(map, &["id", "value", "label"]).map(display_string)?;
            if id.trim().is_empty() {
                return None;
            }
            let label = lookup_ci(map, &["label", "name", "title", "text"])
                .map(display_string)
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| id.clone());
            Some((normalize(&id).to_lowercase(), label))
        }
        Value::Null => None,
        other => {
            let text = display_string(other);
            if text.trim().is_empty() {
                return None;
            }
            Some((normalize(&text).to_lowercase(), text))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::diff_value_lists;
    use crate::change_fact::{ChangeFact, ListDeltaKind};

    #[test]
    fn reordering_produces_no_fact() {
        let before = [json!("a"), json!("b"), json!("c")];
        let after = [json!("c"), json!("a"), json!("b")];

        assert!(diff_value_lists(&before, &after, ListDeltaKind::Options, None).is_none());
    }

    #[test]
    fn membership_changes_are_reported_by_label() {
        let before = [json!({"id": "1", "label": "Yes"}), json!({"id": "2", "label": "No"})];
        let after = [json!({"id": "1", "label": "Yes"}), json!({"id": "3", "label": "Maybe"})];

        let fact = diff_value_lists(&before, &after, ListDeltaKind::Options, None);

        assert!(matches!(
            fact,
            Some(ChangeFact::ListDelta { added, removed, .. })
                if added == vec!["Maybe"] && removed == vec!["No"]
        ));
    }

    #[test]
    fn identity_falls_back_from_id_to_value_to_label() {
        let before = [json!({"value": "v1"}), json!({"label": "only-label"})];
        let after = [json!({"value": "v1"})];

        let fact = diff_value_lists(&before, &after, ListDeltaKind::Options, None);

        assert!(matches!(
            fact,
            Some(ChangeFact::ListDelta { removed, .. }) if removed == vec!["only-label"]
        ));
    }

    #[test]
    fn duplicate_identities_collapse() {
        let before = [json!("a"), json!("A ")];
        let after = [json!("a")];

        assert!(diff_value_lists(&before, &after, ListDeltaKind::Options, None).is_none());
    }
}
