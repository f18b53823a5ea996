use serde_json::{Map, Value};

use crate::change_fact::{ChangeFact, ListDeltaKind};
use crate::document::{Snapshot, display_string, lookup_ci};
use crate::normalize::{is_equivalent, normalize};

// Properties examined individually, plus identity and ordering fields.
// Anything outside this set only ever contributes a generic remark.
const KNOWN_QUESTION_KEYS: &[&str] = &[
    "id",
    "temporaryid",
    "order",
    "sortorder",
    "title",
    "label",
    "type",
    "questiontype",
    "required",
    "isrequired",
    "description",
    "options",
    "choices",
    "rows",
    "gridrows",
    "columns",
    "gridcolumns",
    "max",
    "min",
    "icontype",
];

/// Diffs two questionnaire structure payloads.
///
/// Questions are collected from both the `questions` and `items` containers
/// of every section and deduplicated by stable identity: persistent id,
/// falling back to the draft `temporaryId`, falling back to the normalized
/// title. Matched questions are examined property by property in a fixed
/// order; additions and removals are reported by title.
///
/// Returns `None` when either payload fails to parse.
#[must_use]
pub fn diff_questionnaire_structure(
    before_json: &str,
    after_json: &str,
) -> Option<Vec<ChangeFact>> {
    let before = Snapshot::parse(before_json)?;
    let after = Snapshot::parse(after_json)?;

    let before_sections = sections_of(&before);
    let after_sections = sections_of(&after);

    let (before_questions, before_unidentified) = collect_questions(&before_sections);
    let (after_questions, after_unidentified) = collect_questions(&after_sections);

    let mut facts = Vec::new();

    for question in &after_questions {
        if !before_questions.iter().any(|other| other.key == question.key) {
            facts.push(ChangeFact::FieldAdded {
                name: "question".to_owned(),
                value: question.title.clone(),
            });
        }
    }
    for question in &before_questions {
        if !after_questions.iter().any(|other| other.key == question.key) {
            facts.push(ChangeFact::FieldRemoved {
                name: "question".to_owned(),
                value: question.title.clone(),
            });
        }
    }
    for question in &after_questions {
        if let Some(previous) = before_questions
            .iter()
            .find(|other| other.key == question.key)
        {
            diff_question(previous, question, &mut facts);
        }
    }

    if facts.is_empty() {
        if before_sections.len() != after_sections.len() {
            facts.push(ChangeFact::CountDelta {
                label: "sections".to_owned(),
                before: before_sections.len(),
                after: after_sections.len(),
            });
        } else {
            let before_total = before_questions.len() + before_unidentified;
            let after_total = after_questions.len() + after_unidentified;
            if before_total != after_total {
                facts.push(ChangeFact::CountDelta {
                    label: "questions".to_owned(),
                    before: before_total,
                    after: after_total,
                });
            }
        }
    }

    Some(facts)
}

struct QuestionView<'a> {
    key: String,
    title: String,
    fields: &'a Map<String, Value>,
}

fn sections_of(snapshot: &Snapshot) -> Vec<&Map<String, Value>> {
    if let Some(sections) = snapshot.field(&["sections"]).and_then(Value::as_array) {
        return sections.iter().filter_map(Value::as_object).collect();
    }

    // Flat payloads without a section wrapper act as one section.
    snapshot.as_object().map(|root| vec![root]).unwrap_or_default()
}

fn collect_questions<'a>(sections: &[&'a Map<String, Value>]) -> (Vec<QuestionView<'a>>, usize) {
    let mut questions: Vec<QuestionView<'a>> = Vec::new();
    let mut unidentified = 0_usize;

    for section in sections {
        for container in ["questions", "items"] {
            let Some(elements) = lookup_ci(section, &[container]).and_then(Value::as_array) else {
                continue;
            };

            for element in elements {
                let Some(fields) = element.as_object() else {
                    unidentified += 1;
                    continue;
                };
                let Some(key) = question_key(fields) else {
                    unidentified += 1;
                    continue;
                };
                if questions.iter().any(|question| question.key == key) {
                    continue;
                }

                let title = non_blank(lookup_ci(fields, &["title", "label"]))
                    .unwrap_or_else(|| "untitled".to_owned());
                questions.push(QuestionView { key, title, fields });
            }
        }
    }

    (questions, unidentified)
}

fn question_key(fields: &Map<String, Value>) -> Option<String> {
    if let Some(id) = non_blank(lookup_ci(fields, &["id"])) {
        return Some(format!("id:{}", normalize(&id).to_lowercase()));
    }
    if let Some(temporary) = non_blank(lookup_ci(fields, &["temporaryId"])) {
        return Some(format!("tmp:{}", normalize(&temporary).to_lowercase()));
    }

    non_blank(lookup_ci(fields, &["title", "label"]))
        .map(|title| format!("title:{}", normalize(&title).to_lowercase()))
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(value) => {
            let text = display_string(value);
            (!text.trim().is_empty()).then_some(text)
        }
    }
}

fn diff_question(previous: &QuestionView<'_>, current: &QuestionView<'_>, facts: &mut Vec<ChangeFact>) {
    let scoped = |aspect: &str| format!("question '{}' {aspect}", current.title);

    diff_scalar(previous, current, &["title", "label"], &scoped("title"), facts);
    diff_scalar(
        previous,
        current,
        &["type", "questionType"],
        &scoped("type"),
        facts,
    );
    diff_required(previous, current, &scoped("required"), facts);
    diff_description(previous, current, &scoped("description"), facts);

    diff_question_list(
        previous,
        current,
        &["options", "choices"],
        ListDeltaKind::Options,
        facts,
    );
    diff_question_list(
        previous,
        current,
        &["rows", "gridRows"],
        ListDeltaKind::GridRows,
        facts,
    );
    diff_question_list(
        previous,
        current,
        &["columns", "gridColumns"],
        ListDeltaKind::GridColumns,
        facts,
    );

    diff_scalar(previous, current, &["max"], &scoped("max"), facts);
    diff_scalar(previous, current, &["min"], &scoped("min"), facts);
    diff_scalar(previous, current, &["iconType"], &scoped("icon type"), facts);

    if has_unknown_property_change(previous.fields, current.fields) {
        facts.push(ChangeFact::Remark(format!(
            "question '{}' properties changed",
            current.title
        )));
    }
}

fn diff_scalar(
    previous: &QuestionView<'_>,
    current: &QuestionView<'_>,
    aliases: &[&str],
    name: &str,
    facts: &mut Vec<ChangeFact>,
) {
    let before = non_blank(lookup_ci(previous.fields, aliases));
    let after = non_blank(lookup_ci(current.fields, aliases));

    if is_equivalent(before.as_deref(), after.as_deref()) {
        return;
    }

    facts.push(ChangeFact::FieldModified {
        name: name.to_owned(),
        before: before.unwrap_or_default(),
        after: after.unwrap_or_default(),
    });
}

fn diff_required(
    previous: &QuestionView<'_>,
    current: &QuestionView<'_>,
    name: &str,
    facts: &mut Vec<ChangeFact>,
) {
    let before = non_blank(lookup_ci(previous.fields, &["required", "isRequired"]));
    let after = non_blank(lookup_ci(current.fields, &["required", "isRequired"]));

    if is_equivalent(before.as_deref(), after.as_deref()) {
        return;
    }

    facts.push(ChangeFact::FieldModified {
        name: name.to_owned(),
        before: yes_no(before.as_deref()),
        after: yes_no(after.as_deref()),
    });
}

fn yes_no(value: Option<&str>) -> String {
    let truthy = value
        .map(|raw| {
            let normalized = normalize(raw);
            normalized == "true" || normalized == "1"
        })
        .unwrap_or(false);
    if truthy { "Yes".to_owned() } else { "No".to_owned() }
}

fn diff_description(
    previous: &QuestionView<'_>,
    current: &QuestionView<'_>,
    name: &str,
    facts: &mut Vec<ChangeFact>,
) {
    let before = non_blank(lookup_ci(previous.fields, &["description", "desc"]));
    let after = non_blank(lookup_ci(current.fields, &["description", "desc"]));

    if is_equivalent(before.as_deref(), after.as_deref()) {
        return;
    }

    match (before, after) {
        (None, Some(value)) => facts.push(ChangeFact::FieldAdded {
            name: name.to_owned(),
            value,
        }),
        (Some(value), None) => facts.push(ChangeFact::FieldRemoved {
            name: name.to_owned(),
            value,
        }),
        (Some(before), Some(after)) => facts.push(ChangeFact::FieldModified {
            name: name.to_owned(),
            before,
            after,
        }),
        (None, None) => {}
    }
}

fn diff_question_list(
    previous: &QuestionView<'_>,
    current: &QuestionView<'_>,
    aliases: &[&str],
    kind: ListDeltaKind,
    facts: &mut Vec<ChangeFact>,
) {
    let empty = Vec::new();
    let before = lookup_ci(previous.fields, aliases)
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let after = lookup_ci(current.fields, aliases)
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    if let Some(fact) =
        super::lists::diff_value_lists(before, after, kind, Some(current.title.clone()))
    {
        facts.push(fact);
    }
}

fn has_unknown_property_change(previous: &Map<String, Value>, current: &Map<String, Value>) -> bool {
    let mut names: Vec<&str> = Vec::new();
    for key in previous.keys().chain(current.keys()) {
        if KNOWN_QUESTION_KEYS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(key))
        {
            continue;
        }
        if !names.iter().any(|seen| seen.eq_ignore_ascii_case(key)) {
            names.push(key.as_str());
        }
    }

    names.into_iter().any(|name| {
        let before = non_blank(lookup_ci(previous, &[name]));
        let after = non_blank(lookup_ci(current, &[name]));
        !is_equivalent(before.as_deref(), after.as_deref())
    })
}

#[cfg(test)]
mod tests {
    use super::diff_questionnaire_structure;
    use crate::change_fact::{ChangeFact, ListDeltaKind};

    fn structure(sections: &str) -> String {
        format!("{{\"sections\": {sections}}}")
    }

    #[test]
    fn question_present_in_both_containers_counts_once() {
        let before = structure(
            r#"[{"name": "S1",
                "questions": [{"id": "q1", "title": "Age"}],
                "items": [{"id": "q1", "title": "Age"}]}]"#,
        );
        let after = structure(
            r#"[{"name": "S1",
                "questions": [{"id": "q1", "title": "Age"}],
                "items": []}]"#,
        );

        let facts = diff_questionnaire_structure(&before, &after);
        assert_eq!(facts, Some(Vec::new()));
    }

    #[test]
    fn title_change_matches_by_id_and_reports_both_titles() {
        let before = structure(r#"[{"questions": [{"id": "q1", "title": "Age"}]}]"#);
        let after = structure(r#"[{"questions": [{"id": "q1", "title": "Your age"}]}]"#);

        let facts = diff_questionnaire_structure(&before, &after).unwrap_or_default();

        assert_eq!(facts.len(), 1);
        assert!(matches!(
            &facts[0],
            ChangeFact::FieldModified { before, after, .. }
                if before == "Age" && after == "Your age"
        ));
    }

    #[test]
    fn draft_questions_match_by_temporary_id() {
        let before = structure(r#"[{"questions": [{"temporaryId": "t-9", "title": "Draft"}]}]"#);
        let after =
            structure(r#"[{"questions": [{"temporaryId": "t-9", "title": "Draft", "required": true}]}]"#);

        let facts = diff_questionnaire_structure(&before, &after).unwrap_or_default();

        assert_eq!(facts.len(), 1);
        assert!(matches!(
            &facts[0],
            ChangeFact::FieldModified { name, before, after }
                if name.contains("required") && before == "No" && after == "Yes"
        ));
    }

    #[test]
    fn option_membership_is_scoped_to_the_question() {
        let before = structure(
            r#"[{"questions": [{"id": "q1", "title": "Color", "options": ["Red", "Blue"]}]}]"#,
        );
        let after = structure(
            r#"[{"questions": [{"id": "q1", "title": "Color", "options": ["Blue", "Green"]}]}]"#,
        );

        let facts = diff_questionnaire_structure(&before, &after).unwrap_or_default();

        assert_eq!(facts.len(), 1);
        assert!(matches!(
            &facts[0],
            ChangeFact::ListDelta { kind: ListDeltaKind::Options, scope: Some(scope), added, removed }
                if scope == "Color" && added == &vec!["Green".to_owned()] && removed == &vec!["Red".to_owned()]
        ));
    }

    #[test]
    fn unknown_property_changes_collapse_to_one_remark() {
        let before = structure(
            r#"[{"questions": [{"id": "q1", "title": "Age", "weight": 1, "hint": "a"}]}]"#,
        );
        let after = structure(
            r#"[{"questions": [{"id": "q1", "title": "Age", "weight": 2, "hint": "b"}]}]"#,
        );

        let facts = diff_questionnaire_structure(&before, &after).unwrap_or_default();

        assert_eq!(facts.len(), 1);
        assert!(matches!(&facts[0], ChangeFact::Remark(text) if text.contains("properties changed")));
    }

    #[test]
    fn added_and_removed_questions_report_titles() {
        let before = structure(r#"[{"questions": [{"id": "q1", "title": "Age"}]}]"#);
        let after = structure(r#"[{"questions": [{"id": "q2", "title": "Name"}]}]"#);

        let facts = diff_questionnaire_structure(&before, &after).unwrap_or_default();

        assert_eq!(facts.len(), 2);
        assert!(matches!(
            &facts[0],
            ChangeFact::FieldAdded { value, .. } if value == "Name"
        ));
        assert!(matches!(
            &facts[1],
            ChangeFact::FieldRemoved { value, .. } if value == "Age"
        ));
    }

    #[test]
    fn unparseable_payload_yields_none() {
        assert!(diff_questionnaire_structure("{broken", "{}").is_none());
    }

    #[test]
    fn count_delta_when_questions_cannot_be_identified() {
        let before = structure(r#"[{"questions": [{}, {}]}]"#);
        let after = structure(r#"[{"questions": [{}]}]"#);

        let facts = diff_questionnaire_structure(&before, &after).unwrap_or_default();

        assert_eq!(facts.len(), 1);
        assert!(matches!(
            &facts[0],
            ChangeFact::CountDelta { label, before: 2, after: 1 } if label == "questions"
        ));
    }
}
