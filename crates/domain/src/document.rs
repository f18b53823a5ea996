use serde_json::{Map, Value};

/// A parsed entity snapshot.
///
/// Snapshots arrive as JSON text captured before and after an operation.
/// Producers are not consistent about property casing or about whether the
/// payload is JSON or a JSON-encoded string of JSON, so every lookup goes
/// through case-insensitive alias matching and parsing unwraps one layer of
/// string encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    root: Value,
}

impl Snapshot {
    /// Parses snapshot text into a document.
    ///
    /// Returns `None` when the text is not valid JSON, even after unwrapping
    /// one quote layer.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let root = match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::String(inner)) => serde_json::from_str::<Value>(inner.trim()).ok()?,
            Ok(value) => value,
            Err(_) => return None,
        };

        Some(Self { root })
    }

    /// Wraps an already-parsed JSON value.
    #[must_use]
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Returns the root object, if the document is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.root.as_object()
    }

    /// Returns the root array, if the document is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        self.root.as_array()
    }

    /// Looks up the first property matching any alias, ignoring case.
    #[must_use]
    pub fn field(&self, aliases: &[&str]) -> Option<&Value> {
        self.as_object().and_then(|map| lookup_ci(map, aliases))
    }

    /// Returns a display rendering of the first matching property.
    ///
    /// Absent and null properties both come back as `None`.
    #[must_use]
    pub fn field_text(&self, aliases: &[&str]) -> Option<String> {
        match self.field(aliases) {
            None | Some(Value::Null) => None,
            Some(value) => Some(display_string(value)),
        }
    }

    /// Returns the property names of the root object.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Looks up a property in an object by any of the given aliases, ignoring
/// case. The first alias with a match wins.
#[must_use]
pub fn lookup_ci<'a>(map: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    for alias in aliases {
        for (key, value) in map {
            if key.eq_ignore_ascii_case(alias) {
                return Some(value);
            }
        }
    }

    None
}

/// Renders a JSON value for inclusion in human-readable text.
///
/// Strings render without surrounding quotes; nested structures render as
/// compact JSON.
#[must_use]
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Truncates display text to `max` characters, appending `...` when cut.
#[must_use]
pub fn truncate_display(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }

    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

/// Extracts identifier strings from a JSON value holding a list.
///
/// Accepts arrays of strings, numbers, or objects carrying an `id`/`value`
/// property, as well as JSON-encoded array strings.
#[must_use]
pub fn parse_id_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(elements) => elements
            .iter()
            .filter_map(|element| match element {
                Value::String(text) => {
                    let trimmed = text.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_owned())
                }
                Value::Number(number) => Some(number.to_string()),
                Value::Object(map) => lookup_ci(map, &["id", "value"]).map(display_string),
                _ => None,
            })
            .collect(),
        Value::String(text) => parse_id_list_text(text),
        _ => Vec::new(),
    }
}

/// Extracts identifier strings from list text.
///
/// Handles double-encoded JSON arrays (a JSON string whose content is itself
/// a JSON array) and falls back to comma-separated parsing for plain text.
#[must_use]
pub fn parse_id_list_text(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ Value::Array(_)) => parse_id_list(&value),
        Ok(Value::String(inner)) => {
            if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(inner.trim()) {
                parse_id_list(&value)
            } else {
                split_comma_list(inner.as_str())
            }
        }
        _ => split_comma_list(trimmed),
    }
}

fn split_comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}
