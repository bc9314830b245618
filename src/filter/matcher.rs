//! Exclusion predicate: OR across rules, AND within a rule

use crate::constants::filter::MIN_WINDOW_DIMENSION;
use crate::window::WindowRecord;

use super::rules::LabeledRule;
use super::schema::Criterion;

/// Degenerate helper windows (tooltips, offscreen 1x1 input windows, ...)
pub fn below_size_guard(window: &WindowRecord) -> bool {
    window
        .bounds
        .is_some_and(|b| b.width < MIN_WINDOW_DIMENSION || b.height < MIN_WINDOW_DIMENSION)
}

pub fn criterion_matches(criterion: &Criterion, window: &WindowRecord) -> bool {
    window
        .attribute(criterion.property())
        .is_some_and(|value| &value == criterion.value())
}

pub fn rule_matches(rule: &LabeledRule, window: &WindowRecord) -> bool {
    !rule.body.is_empty() && rule.body.iter().all(|c| criterion_matches(c, window))
}

/// True when the window should be hidden from the taskbar
pub fn excluded(window: &WindowRecord, rules: &[LabeledRule]) -> bool {
    below_size_guard(window) || rules.iter().any(|rule| rule_matches(rule, window))
}

/// First rule hiding the window, for diagnostics (`None` for the size guard)
pub fn matching_rule<'a>(window: &WindowRecord, rules: &'a [LabeledRule]) -> Option<&'a LabeledRule> {
    rules.iter().find(|rule| rule_matches(rule, window))
}

/// Windows that survive filtering, in input order
pub fn visible<'a>(windows: &'a [WindowRecord], rules: &[LabeledRule]) -> Vec<&'a WindowRecord> {
    windows.iter().filter(|w| !excluded(w, rules)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Property;
    use crate::window::Bounds;

    fn window(owner: &str, title: &str, width: i64, height: i64) -> WindowRecord {
        WindowRecord {
            owner_name: Some(owner.to_string()),
            window_name: Some(title.to_string()),
            owner_pid: Some(100),
            window_number: Some(7),
            is_onscreen: Some(true),
            bounds: Some(Bounds::new(10, 10, width, height)),
            ..WindowRecord::default()
        }
    }

    fn rule(label: &str, body: Vec<Criterion>) -> LabeledRule {
        LabeledRule::new(label, body)
    }

    fn owner(name: &str) -> Criterion {
        Criterion::new(Property::OwnerName, name).unwrap()
    }

    #[test]
    fn test_single_rule_excludes_matching_window() {
        let dock = window("Dock", "", 800, 600);
        let rules = vec![rule("d", vec![owner("Dock")])];
        assert!(excluded(&dock, &rules));
    }

    #[test]
    fn test_empty_collection_excludes_nothing() {
        let dock = window("Dock", "", 800, 600);
        assert!(!excluded(&dock, &[]));
    }

    #[test]
    fn test_and_within_rule() {
        let finder = window("Finder", "Documents", 800, 600);
        let rules = vec![rule(
            "empty finder",
            vec![owner("Finder"), Criterion::new(Property::WindowName, "").unwrap()],
        )];
        assert!(!excluded(&finder, &rules));

        let untitled = window("Finder", "", 800, 600);
        assert!(excluded(&untitled, &rules));
    }

    #[test]
    fn test_or_across_rules() {
        let rules = vec![rule("a", vec![owner("Dock")]), rule("b", vec![owner("Spotlight")])];
        assert!(excluded(&window("Spotlight", "", 800, 600), &rules));
        assert!(excluded(&window("Dock", "", 800, 600), &rules));
        assert!(!excluded(&window("Safari", "", 800, 600), &rules));
    }

    #[test]
    fn test_size_guard_ignores_rules() {
        assert!(excluded(&window("Safari", "", 39, 600), &[]));
        assert!(excluded(&window("Safari", "", 600, 39), &[]));
        assert!(excluded(&window("Safari", "", 0, 0), &[]));
        assert!(!excluded(&window("Safari", "", 40, 40), &[]));
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let mut w = window("Safari", "", 800, 600);
        w.owner_name = None;
        assert!(!excluded(&w, &[rule("r", vec![owner("Safari")])]));

        let no_bounds = WindowRecord {
            owner_name: Some("Safari".to_string()),
            ..WindowRecord::default()
        };
        let zero_width = vec![rule("w", vec![Criterion::new(Property::Width, 0).unwrap()])];
        assert!(!excluded(&no_bounds, &zero_width));
        assert!(!excluded(&no_bounds, &[]));
    }

    #[test]
    fn test_strict_equality() {
        let w = window("dock", "", 800, 600);
        assert!(!excluded(&w, &[rule("r", vec![owner("Dock")])]));
        assert!(!excluded(&w, &[rule("r", vec![owner("doc")])]));

        let onscreen = vec![rule("r", vec![Criterion::new(Property::IsOnscreen, false).unwrap()])];
        assert!(!excluded(&w, &onscreen));
    }

    #[test]
    fn test_empty_body_never_matches() {
        let w = window("Dock", "", 800, 600);
        assert!(!excluded(&w, &[rule("empty", vec![])]));
    }

    #[test]
    fn test_visible_keeps_order() {
        let windows = vec![
            window("Terminal", "a", 800, 600),
            window("Dock", "", 800, 600),
            window("Safari", "b", 800, 600),
            window("Tooltip", "", 20, 20),
        ];
        let rules = vec![rule("d", vec![owner("Dock")])];
        let names: Vec<_> = visible(&windows, &rules)
            .into_iter()
            .map(|w| w.owner_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["Terminal", "Safari"]);
        assert_eq!(matching_rule(&windows[1], &rules).map(|r| r.label.as_str()), Some("d"));
        assert_eq!(matching_rule(&windows[3], &rules), None);
    }
}
