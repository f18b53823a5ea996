use serde_json::Value;

/// Normalizes a raw field value into its canonical comparison form.
///
/// Rules, applied in order: surrounding whitespace is trimmed; quote-encoded
/// layers are unwrapped until a non-string value or plain text remains; JSON
/// objects and arrays re-serialize to compact sorted-key form; numbers render
/// with the minimal decimal representation (`3.0` becomes `3`); booleans
/// render lower-cased. Text that fails to parse as JSON is kept literally.
/// The result is a fixed point: normalizing twice changes nothing.
#[must_use]
pub fn normalize(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Null) => String::new(),
        Ok(Value::Bool(flag)) => flag.to_string(),
        Ok(Value::Number(number)) => normalize_number(&number),
        Ok(Value::String(inner)) => normalize(inner.as_str()),
        Ok(structured @ (Value::Array(_) | Value::Object(_))) => structured.to_string(),
        Err(_) => trimmed.to_owned(),
    }
}

/// Reports whether two optional raw values are equivalent after
/// normalization.
///
/// Both absent or blank counts as equivalent; exactly one absent or blank
/// counts as a change; otherwise normalized forms compare case-insensitively.
#[must_use]
pub fn is_equivalent(before: Option<&str>, after: Option<&str>) -> bool {
    let before = before.map(normalize).unwrap_or_default();
    let after = after.map(normalize).unwrap_or_default();

    if before.is_empty() && after.is_empty() {
        return true;
    }
    if before.is_empty() || after.is_empty() {
        return false;
    }

    before.to_lowercase() == after.to_lowercase()
}

// Integer-valued floats within the exactly-representable range render
// without the fractional part.
fn normalize_number(number: &serde_json::Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    if let Some(float) = number.as_f64() {
        if float.fract() == 0.0 && float.abs() < 9_007_199_254_740_992.0 {
            return format!("{float:.0}");
        }
        return float.to_string();
    }

    number.to_string()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{is_equivalent, normalize};

    #[test]
    fn trims_and_unwraps_quote_layer() {
        assert_eq!(normalize("  plain  "), "plain");
        assert_eq!(normalize("\"quoted\""), "quoted");
        assert_eq!(normalize("\"  padded  \""), "padded");
        assert_eq!(normalize("\"3.0\""), "3");
    }

    #[test]
    fn numbers_use_minimal_decimal_form() {
        assert_eq!(normalize("3.0"), "3");
        assert_eq!(normalize("3.50"), "3.5");
        assert_eq!(normalize("-12.000"), "-12");
        assert_eq!(normalize("42"), "42");
    }

    #[test]
    fn booleans_lower_case() {
        assert_eq!(normalize("true"), "true");
        assert_eq!(normalize("  false "), "false");
    }

    #[test]
    fn objects_reserialize_with_sorted_keys() {
        let left = normalize(r#"{"b": 2, "a": 1}"#);
        let right = normalize(r#"{ "a": 1,   "b": 2 }"#);
        assert_eq!(left, right);
        assert_eq!(left, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn unparseable_text_survives_literally() {
        assert_eq!(normalize("not {json"), "not {json");
    }

    #[test]
    fn equivalence_handles_absent_and_blank_sides() {
        assert!(is_equivalent(None, None));
        assert!(is_equivalent(Some("   "), None));
        assert!(!is_equivalent(Some("0"), None));
        assert!(!is_equivalent(None, Some("x")));
    }

    #[test]
    fn equivalence_ignores_case_and_formatting() {
        assert!(is_equivalent(Some("Alpha"), Some("alpha")));
        assert!(is_equivalent(Some("3.0"), Some("3")));
        assert!(is_equivalent(Some("\"true\""), Some("TRUE")));
        assert!(!is_equivalent(Some("alpha"), Some("beta")));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(value in ".{0,64}") {
            let once = normalize(&value);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn equivalence_is_symmetric(left in ".{0,32}", right in ".{0,32}") {
            prop_assert_eq!(
                is_equivalent(Some(left.as_str()), Some(right.as_str())),
                is_equivalent(Some(right.as_str()), Some(left.as_str()))
            );
        }
    }
}
