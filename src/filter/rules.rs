//! Labeled rules and their persisted shape

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::format::BODY_FIELDS;
use super::schema::Criterion;

/// AND-combination of criteria
pub type RuleBody = Vec<Criterion>;

/// Rule body paired with a human-readable label
///
/// Persisted as `{"label": .., "filters": [{"property": .., "is": ..}, ..]}`.
/// An empty label is allowed, a missing one is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledRule {
    pub label: String,
    #[serde(rename = "filters", alias = "body", alias = "rules")]
    pub body: RuleBody,
}

impl LabeledRule {
    pub fn new(label: impl Into<String>, body: RuleBody) -> Self {
        Self {
            label: label.into(),
            body,
        }
    }
}

/// Serialize a collection to its persisted shape
pub fn to_json(rules: &[LabeledRule]) -> serde_json::Result<Value> {
    serde_json::to_value(rules)
}

/// Read a labeled collection, dropping what cannot be read
///
/// Invalid criteria are removed from their rule; rules without a string label
/// or without any valid criterion are skipped. Never fails.
pub fn from_json_lossy(raw: &Value) -> Vec<LabeledRule> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| read_rule(index, item))
        .collect()
}

fn read_rule(index: usize, item: &Value) -> Option<LabeledRule> {
    let Some(label) = item.get("label").and_then(Value::as_str) else {
        warn!(index, "skipping stored filter without a string label");
        return None;
    };
    let criteria = BODY_FIELDS
        .iter()
        .find_map(|field| item.get(*field))
        .and_then(Value::as_array);
    let Some(criteria) = criteria else {
        warn!(index, label, "skipping stored filter without a criteria array");
        return None;
    };

    let body: RuleBody = criteria
        .iter()
        .filter_map(|raw| {
            Criterion::from_legacy(raw)
                .inspect_err(|e| warn!(index, label, error = %e, "dropping invalid stored criterion"))
                .ok()
        })
        .collect();

    if body.is_empty() {
        warn!(index, label, "skipping stored filter with no valid criteria");
        return None;
    }
    Some(LabeledRule::new(label, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Property;
    use serde_json::json;

    #[test]
    fn test_from_json_lossy_keeps_valid_rules() {
        let raw = json!([
            {"label": "Dock excluded", "filters": [{"property": "ownerName", "is": "Dock"}]},
            {"label": "broken", "filters": [{"property": "ownerName", "is": 1}]},
            {"filters": [{"property": "x", "is": 0}]},
            {"label": "partly", "filters": [{"property": "x", "is": 0}, {"property": "nope", "is": 0}]},
            "junk"
        ]);
        let rules = from_json_lossy(&raw);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].label, "Dock excluded");
        assert_eq!(rules[1].label, "partly");
        assert_eq!(rules[1].body.len(), 1);
        assert!(from_json_lossy(&json!({"label": "x"})).is_empty());
    }

    #[test]
    fn test_labeled_rule_wire_shape() {
        let rule = LabeledRule::new(
            "Dock excluded",
            vec![Criterion::new(Property::OwnerName, "Dock").unwrap()],
        );
        let expected = json!([{"label": "Dock excluded", "filters": [{"property": "ownerName", "is": "Dock"}]}]);
        assert_eq!(to_json(std::slice::from_ref(&rule)).unwrap(), expected);
        assert_eq!(to_json(&[]).unwrap(), json!([]));

        let parsed: Vec<LabeledRule> = serde_json::from_value(expected).unwrap();
        assert_eq!(parsed, vec![rule]);
    }

    #[test]
    fn test_label_field_is_required() {
        let missing = serde_json::from_value::<LabeledRule>(json!({"filters": []}));
        assert!(missing.is_err());

        let empty: LabeledRule =
            serde_json::from_value(json!({"label": "", "body": [{"property": "x", "is": 0}]})).unwrap();
        assert_eq!(empty.label, "");
        assert_eq!(empty.body.len(), 1);
    }
}
