//! Schema registry and criterion validation
//!
//! The set of window properties a filter may test is closed: each property is
//! bound to exactly one value kind. A [`Criterion`] can only be constructed
//! when its value has the kind its property declares, so typed rule bodies are
//! valid by construction. Raw JSON criteria go through [`validate`] or
//! [`Criterion::from_legacy`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Value kind a property is declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Integer,
    Flag,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Flag => "flag",
        })
    }
}

/// Window attribute usable in a filter criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    OwnerName,
    WindowName,
    OwnerPid,
    WindowNumber,
    WindowLayer,
    MemoryUsage,
    IsOnscreen,
    X,
    Y,
    Width,
    Height,
}

impl Property {
    pub const ALL: [Property; 11] = [
        Property::OwnerName,
        Property::WindowName,
        Property::OwnerPid,
        Property::WindowNumber,
        Property::WindowLayer,
        Property::MemoryUsage,
        Property::IsOnscreen,
        Property::X,
        Property::Y,
        Property::Width,
        Property::Height,
    ];

    /// Name used in persisted rules (`{"property": <name>, "is": ..}`)
    pub fn name(self) -> &'static str {
        match self {
            Property::OwnerName => "ownerName",
            Property::WindowName => "windowName",
            Property::OwnerPid => "ownerPID",
            Property::WindowNumber => "windowNumber",
            Property::WindowLayer => "windowLayer",
            Property::MemoryUsage => "memoryUsage",
            Property::IsOnscreen => "isOnscreen",
            Property::X => "x",
            Property::Y => "y",
            Property::Width => "width",
            Property::Height => "height",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Property::OwnerName | Property::WindowName => ValueKind::Text,
            Property::IsOnscreen => ValueKind::Flag,
            Property::OwnerPid
            | Property::WindowNumber
            | Property::WindowLayer
            | Property::MemoryUsage
            | Property::X
            | Property::Y
            | Property::Width
            | Property::Height => ValueKind::Integer,
        }
    }

    /// Look up a property by its persisted name (exact, case-sensitive)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed criterion value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl FilterValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FilterValue::Text(_) => ValueKind::Text,
            FilterValue::Integer(_) => ValueKind::Integer,
            FilterValue::Flag(_) => ValueKind::Flag,
        }
    }

    /// Read a JSON value as the given kind
    ///
    /// Integers must be finite and integral; `1.0` is accepted, `1.5` is not.
    pub fn from_json(kind: ValueKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (ValueKind::Text, Value::String(s)) => Some(FilterValue::Text(s.clone())),
            (ValueKind::Flag, Value::Bool(b)) => Some(FilterValue::Flag(*b)),
            (ValueKind::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Some(FilterValue::Integer(i));
                }
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Some(FilterValue::Integer(f as i64))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse command-line text as the given kind
    pub fn parse(kind: ValueKind, raw: &str) -> Option<Self> {
        match kind {
            ValueKind::Text => Some(FilterValue::Text(raw.to_string())),
            ValueKind::Integer => raw.trim().parse().ok().map(FilterValue::Integer),
            ValueKind::Flag => raw.trim().parse().ok().map(FilterValue::Flag),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Text(s) => Value::String(s.clone()),
            FilterValue::Integer(i) => Value::from(*i),
            FilterValue::Flag(b) => Value::Bool(*b),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Integer(i) => write!(f, "{i}"),
            FilterValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Flag(value)
    }
}

/// Reasons a single raw criterion cannot become a [`Criterion`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriterionError {
    #[error("criterion must be an object, got {0}")]
    NotAnObject(&'static str),
    #[error("criterion has no string `property` field")]
    MissingProperty,
    #[error("unknown property `{0}`")]
    UnknownProperty(String),
    #[error("criterion for `{0}` has no `is` value")]
    MissingValue(Property),
    #[error("property `{property}` expects {expected}, got {found}")]
    KindMismatch {
        property: Property,
        expected: ValueKind,
        found: String,
    },
    #[error("expected `property=value`, got `{0}`")]
    MalformedAssignment(String),
}

/// Single property/value equality test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Criterion {
    property: Property,
    value: FilterValue,
}

impl Criterion {
    pub fn new(property: Property, value: impl Into<FilterValue>) -> Result<Self, CriterionError> {
        let value = value.into();
        if value.kind() != property.kind() {
            return Err(CriterionError::KindMismatch {
                property,
                expected: property.kind(),
                found: value.kind().to_string(),
            });
        }
        Ok(Self { property, value })
    }

    /// Convert one persisted `{property, is}` object
    ///
    /// This is the only fallible conversion in the engine. Batch callers
    /// (migration, rule loading) catch the error and drop the item.
    pub fn from_legacy(raw: &Value) -> Result<Self, CriterionError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| CriterionError::NotAnObject(json_type_name(raw)))?;

        let name = match obj.get("property") {
            Some(Value::String(name)) => name,
            _ => return Err(CriterionError::MissingProperty),
        };
        let property =
            Property::parse(name).ok_or_else(|| CriterionError::UnknownProperty(name.clone()))?;

        let value = obj.get("is").ok_or(CriterionError::MissingValue(property))?;
        let value = FilterValue::from_json(property.kind(), value).ok_or_else(|| {
            CriterionError::KindMismatch {
                property,
                expected: property.kind(),
                found: json_type_name(value).to_string(),
            }
        })?;

        Ok(Self { property, value })
    }

    /// Parse `property=value` as typed on the command line
    pub fn parse_assignment(raw: &str) -> Result<Self, CriterionError> {
        let (name, value) = raw
            .split_once('=')
            .ok_or_else(|| CriterionError::MalformedAssignment(raw.to_string()))?;
        let name = name.trim();
        let property =
            Property::parse(name).ok_or_else(|| CriterionError::UnknownProperty(name.to_string()))?;
        let value = FilterValue::parse(property.kind(), value).ok_or_else(|| {
            CriterionError::KindMismatch {
                property,
                expected: property.kind(),
                found: format!("`{value}`"),
            }
        })?;
        Ok(Self { property, value })
    }

    pub fn property(&self) -> Property {
        self.property
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("property".to_string(), Value::String(self.property.name().to_string()));
        obj.insert("is".to_string(), self.value.to_json());
        Value::Object(obj)
    }
}

impl TryFrom<Value> for Criterion {
    type Error = CriterionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Criterion::from_legacy(&value)
    }
}

impl From<Criterion> for Value {
    fn from(criterion: Criterion) -> Self {
        criterion.to_json()
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.property, self.value)
    }
}

/// Check one raw property/value pair against the schema
pub fn validate(property: &str, value: &Value) -> bool {
    Property::parse(property)
        .is_some_and(|property| FilterValue::from_json(property.kind(), value).is_some())
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
