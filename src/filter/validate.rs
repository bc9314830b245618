//! Structural validation of labeled rule collections
//!
//! Used as a pre-save guard and on hand-edited files. An empty collection is
//! deliberately invalid: "no rules" is stored as an absent/null value, never
//! as `[]`.

use serde_json::Value;

use super::format::BODY_FIELDS;
use super::rules::LabeledRule;
use super::schema::validate;

pub fn is_valid(collection: &Value) -> bool {
    match collection.as_array() {
        Some(rules) if !rules.is_empty() => rules.iter().all(is_valid_rule),
        _ => false,
    }
}

fn is_valid_rule(rule: &Value) -> bool {
    let Some(obj) = rule.as_object() else {
        return false;
    };
    if !obj.get("label").is_some_and(Value::is_string) {
        return false;
    }

    let body = BODY_FIELDS.iter().find_map(|field| obj.get(*field));
    match body.and_then(Value::as_array) {
        Some(criteria) if !criteria.is_empty() => criteria.iter().all(is_valid_criterion),
        _ => false,
    }
}

fn is_valid_criterion(criterion: &Value) -> bool {
    let Some(obj) = criterion.as_object() else {
        return false;
    };
    match (obj.get("property").and_then(Value::as_str), obj.get("is")) {
        (Some(property), Some(value)) => validate(property, value),
        _ => false,
    }
}

/// Typed counterpart of [`is_valid`]; criteria are valid by construction
pub fn is_valid_rules(rules: &[LabeledRule]) -> bool {
    !rules.is_empty() && rules.iter().all(|rule| !rule.body.is_empty())
}
