//! Persisted rule format detection
//!
//! Nothing in the store records a schema version; the shape of the first
//! element decides which load path a collection takes.

use serde_json::Value;
use std::fmt;

/// Field names accepted as the body of a labeled rule
pub const BODY_FIELDS: [&str; 3] = ["filters", "body", "rules"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    /// Array of bare rule bodies
    Legacy,
    /// Array of `{label, filters}` objects
    Labeled,
    Unknown,
}

impl fmt::Display for RuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleFormat::Legacy => "legacy",
            RuleFormat::Labeled => "labeled",
            RuleFormat::Unknown => "unknown",
        })
    }
}

pub fn detect(raw: &Value) -> RuleFormat {
    let Some(first) = raw.as_array().and_then(|items| items.first()) else {
        return RuleFormat::Unknown;
    };

    match first {
        Value::Object(obj)
            if obj.contains_key("label") && BODY_FIELDS.iter().any(|f| obj.contains_key(*f)) =>
        {
            RuleFormat::Labeled
        }
        Value::Array(_) => RuleFormat::Legacy,
        _ => RuleFormat::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_unknown_for_non_arrays_and_empty() {
        assert_eq!(detect(&json!([])), RuleFormat::Unknown);
        assert_eq!(detect(&Value::Null), RuleFormat::Unknown);
        assert_eq!(detect(&json!({"label": "a", "filters": []})), RuleFormat::Unknown);
        assert_eq!(detect(&json!("[[]]")), RuleFormat::Unknown);
    }

    #[test]
    fn test_detect_legacy() {
        assert_eq!(detect(&json!([[{"property": "x", "is": 1}]])), RuleFormat::Legacy);
        // Shape only: an empty first body is still the legacy shape
        assert_eq!(detect(&json!([[]])), RuleFormat::Legacy);
    }

    #[test]
    fn test_detect_labeled() {
        assert_eq!(
            detect(&json!([{"label": "a", "filters": [{"property": "x", "is": 1}]}])),
            RuleFormat::Labeled
        );
        assert_eq!(detect(&json!([{"label": "", "body": []}])), RuleFormat::Labeled);
        assert_eq!(detect(&json!([{"label": "a", "rules": []}])), RuleFormat::Labeled);
    }

    #[test]
    fn test_detect_only_looks_at_first_element() {
        assert_eq!(detect(&json!([{"label": "a"}, [{"property": "x", "is": 1}]])), RuleFormat::Unknown);
        assert_eq!(detect(&json!([{"filters": []}])), RuleFormat::Unknown);
        assert_eq!(detect(&json!([42])), RuleFormat::Unknown);
    }
}
