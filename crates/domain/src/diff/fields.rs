use crate::change_fact::ChangeFact;
use crate::document::Snapshot;
use crate::normalize::is_equivalent;

/// Returns the names of fields whose values meaningfully differ between two
/// snapshots.
///
/// The result covers the union of both property sets, keeps the after
/// snapshot's ordering for fields it knows, and compares values through the
/// normalizer so formatting-only differences do not count.
#[must_use]
pub fn changed_field_names(before: &Snapshot, after: &Snapshot) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for name in after.field_names() {
        if !names.iter().any(|seen| seen.eq_ignore_ascii_case(&name)) {
            names.push(name);
        }
    }
    for name in before.field_names() {
        if !names.iter().any(|seen| seen.eq_ignore_ascii_case(&name)) {
            names.push(name);
        }
    }

    names
        .into_iter()
        .filter(|name| {
            let aliases = [name.as_str()];
            let before_value = before.field_text(&aliases);
            let after_value = after.field_text(&aliases);
            !is_equivalent(before_value.as_deref(), after_value.as_deref())
        })
        .collect()
}

/// Produces field-level facts for the named fields.
///
/// Fields equivalent on both sides yield nothing; fields present on only one
/// side yield added/removed facts.
#[must_use]
pub fn diff_named_fields(before: &Snapshot, after: &Snapshot, names: &[String]) -> Vec<ChangeFact> {
    let mut facts = Vec::new();

    for name in names {
        let aliases = [name.as_str()];
        let before_value = before.field_text(&aliases);
        let after_value = after.field_text(&aliases);

        if is_equivalent(before_value.as_deref(), after_value.as_deref()) {
            continue;
        }

        match (before_value, after_value) {
            (None, Some(value)) => facts.push(ChangeFact::FieldAdded {
                name: name.clone(),
                value,
            }),
            (Some(value), None) => facts.push(ChangeFact::FieldRemoved {
                name: name.clone(),
                value,
            }),
            (Some(before_value), Some(after_value)) => facts.push(ChangeFact::FieldModified {
                name: name.clone(),
                before: before_value,
                after: after_value,
            }),
            (None, None) => {}
        }
    }

    facts
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{changed_field_names, diff_named_fields};
    use crate::change_fact::ChangeFact;
    use crate::document::Snapshot;

    fn snapshot(value: serde_json::Value) -> Snapshot {
        Snapshot::from_value(value)
    }

    #[test]
    fn formatting_only_differences_do_not_count_as_changes() {
        let before = snapshot(json!({"priority": "3.0", "name": "Intake"}));
        let after = snapshot(json!({"priority": 3, "name": "intake"}));

        assert!(changed_field_names(&before, &after).is_empty());
    }

    #[test]
    fn union_of_both_sides_is_examined() {
        let before = snapshot(json!({"name": "Intake", "legacy": "x"}));
        let after = snapshot(json!({"name": "Intake", "owner": "Dana"}));

        let mut names = changed_field_names(&before, &after);
        names.sort();
        assert_eq!(names, vec!["legacy", "owner"]);
    }

    #[test]
    fn named_diff_distinguishes_added_removed_modified() {
        let before = snapshot(json!({"name": "Intake", "legacy": "x"}));
        let after = snapshot(json!({"name": "Kickoff", "owner": "Dana"}));
        let names = vec!["name".to_owned(), "legacy".to_owned(), "owner".to_owned()];

        let facts = diff_named_fields(&before, &after, &names);

        assert_eq!(facts.len(), 3);
        assert!(matches!(
            &facts[0],
            ChangeFact::FieldModified { name, before, after }
                if name == "name" && before == "Intake" && after == "Kickoff"
        ));
        assert!(matches!(
            &facts[1],
            ChangeFact::FieldRemoved { name, .. } if name == "legacy"
        ));
        assert!(matches!(
            &facts[2],
            ChangeFact::FieldAdded { name, value } if name == "owner" && value == "Dana"
        ));
    }
}
