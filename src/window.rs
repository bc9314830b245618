//! Window records as produced by a window source
//!
//! Records are captured once per enumeration pass and never mutated by the
//! filter. Every schema attribute is optional: a source that cannot read an
//! attribute leaves it unset, and unset attributes never match a criterion.

use serde::{Deserialize, Serialize};

use crate::filter::{FilterValue, Property};

/// Bounding box in root-window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(alias = "X")]
    pub x: i64,
    #[serde(alias = "Y")]
    pub y: i64,
    #[serde(alias = "Width")]
    pub width: i64,
    #[serde(alias = "Height")]
    pub height: i64,
}

impl Bounds {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_name: Option<String>,
    #[serde(rename = "ownerPID", default, skip_serializing_if = "Option::is_none")]
    pub owner_pid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_layer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_onscreen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

impl WindowRecord {
    /// Typed value of a schema property, `None` when the source did not set it
    pub fn attribute(&self, property: Property) -> Option<FilterValue> {
        let bounds = self.bounds.as_ref();
        match property {
            Property::OwnerName => self.owner_name.clone().map(FilterValue::Text),
            Property::WindowName => self.window_name.clone().map(FilterValue::Text),
            Property::OwnerPid => self.owner_pid.map(FilterValue::Integer),
            Property::WindowNumber => self.window_number.map(FilterValue::Integer),
            Property::WindowLayer => self.window_layer.map(FilterValue::Integer),
            Property::MemoryUsage => self.memory_usage.map(FilterValue::Integer),
            Property::IsOnscreen => self.is_onscreen.map(FilterValue::Flag),
            Property::X => bounds.map(|b| FilterValue::Integer(b.x)),
            Property::Y => bounds.map(|b| FilterValue::Integer(b.y)),
            Property::Width => bounds.map(|b| FilterValue::Integer(b.width)),
            Property::Height => bounds.map(|b| FilterValue::Integer(b.height)),
        }
    }

    /// Short human-readable description for CLI output and logs
    pub fn display_name(&self) -> String {
        let owner = self.owner_name.as_deref().unwrap_or("?");
        match self.window_name.as_deref() {
            Some(title) if !title.is_empty() => format!("{owner}: {title}"),
            _ => owner.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_kinds_match_schema() {
        let window = WindowRecord {
            owner_name: Some("Dock".to_string()),
            window_name: Some("".to_string()),
            owner_pid: Some(1),
            window_number: Some(2),
            window_layer: Some(3),
            memory_usage: Some(4),
            is_onscreen: Some(true),
            bounds: Some(Bounds::new(5, 6, 7, 8)),
        };
        for property in Property::ALL {
            let value = window.attribute(property).unwrap();
            assert_eq!(value.kind(), property.kind(), "{property}");
        }
        assert_eq!(window.attribute(Property::Height), Some(FilterValue::Integer(8)));
    }

    #[test]
    fn test_missing_attributes_are_none() {
        let window = WindowRecord::default();
        for property in Property::ALL {
            assert_eq!(window.attribute(property), None);
        }
    }

    #[test]
    fn test_deserialize_accepts_extra_fields_and_aliases() {
        let window: WindowRecord = serde_json::from_value(json!({
            "ownerName": "Terminal",
            "windowName": "bash",
            "ownerPID": 77,
            "alpha": 1.0,
            "bounds": {"X": 0, "Y": 25, "Width": 800, "Height": 600}
        }))
        .unwrap();
        assert_eq!(window.owner_pid, Some(77));
        assert_eq!(window.bounds, Some(Bounds::new(0, 25, 800, 600)));
        assert_eq!(window.display_name(), "Terminal: bash");
    }
}
