//! Persisted filter rules
//!
//! Owns the load sequencing around the engine: detect the stored shape,
//! migrate a legacy collection once, persist the labeled form together with
//! a format marker so the legacy path is never taken again.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::constants::config::{FILTERS_KEY, FORMAT_KEY, LABELED_FORMAT};
use crate::filter::phrases::{CriterionPattern, Literal};
use crate::filter::{
    Criterion, LabeledRule, Property, RuleBody, RuleFormat, detect, is_valid, is_valid_rules,
    migrate_with_report, rules, synthesize,
};

use super::store::ConfigStore;

/// Desktop chrome hidden on first run
const DEFAULT_RULES: &[&[CriterionPattern]] = &[
    &[CriterionPattern::new(Property::OwnerName, Literal::Text("Dock"))],
    &[CriterionPattern::new(Property::OwnerName, Literal::Text("Window Server"))],
    &[CriterionPattern::new(Property::OwnerName, Literal::Text("SystemUIServer"))],
    &[
        CriterionPattern::new(Property::OwnerName, Literal::Text("Finder")),
        CriterionPattern::new(Property::WindowName, Literal::Text("")),
    ],
    &[CriterionPattern::new(Property::OwnerName, Literal::Text("plasmashell"))],
    &[CriterionPattern::new(Property::OwnerName, Literal::Text("Xfce4-panel"))],
    &[CriterionPattern::new(Property::OwnerName, Literal::Text("Polybar"))],
    &[CriterionPattern::new(Property::OwnerName, Literal::Text("Dunst"))],
    &[CriterionPattern::new(Property::OwnerName, Literal::Text("Conky"))],
    &[CriterionPattern::new(Property::WindowName, Literal::Text("Desktop"))],
];

pub fn default_rules() -> Vec<LabeledRule> {
    DEFAULT_RULES
        .iter()
        .filter_map(|patterns| {
            let body: RuleBody = patterns
                .iter()
                .filter_map(|p| Criterion::new(p.property, p.value).ok())
                .collect();
            (!body.is_empty()).then(|| LabeledRule::new(synthesize(&body), body))
        })
        .collect()
}

/// Load the active rules, upgrading the stored collection if needed
///
/// Never fails: storage problems are logged and the rules read so far are
/// returned, so a corrupted config can't stop windows from being listed.
pub fn load_rules(store: &mut impl ConfigStore) -> Vec<LabeledRule> {
    let Some(raw) = store.get(FILTERS_KEY) else {
        let rules = default_rules();
        info!(count = rules.len(), "no filters configured, seeding defaults");
        if let Err(e) = save_rules(store, &rules) {
            error!(error = ?e, "Failed to save default filters");
        }
        return rules;
    };

    if raw.is_null() {
        debug!("filters cleared by user");
        return Vec::new();
    }

    let marked = store
        .get(FORMAT_KEY)
        .is_some_and(|marker| marker.as_str() == Some(LABELED_FORMAT));
    let format = if marked { RuleFormat::Labeled } else { detect(&raw) };
    debug!(format = %format, marked, "loading filters");

    match format {
        RuleFormat::Labeled => {
            let rules = rules::from_json_lossy(&raw);
            if !marked && let Err(e) = store.set(FORMAT_KEY, Value::from(LABELED_FORMAT)) {
                error!(error = ?e, "Failed to record filters format");
            }
            rules
        }
        RuleFormat::Legacy => {
            let report = migrate_with_report(&raw);
            if !report.is_lossless() {
                warn!(
                    skipped = report.skipped.len(),
                    dropped_criteria = report.dropped_criteria,
                    "some legacy filters could not be migrated and were dropped"
                );
            }
            if let Err(e) = save_rules(store, &report.rules) {
                error!(error = ?e, "Failed to save migrated filters, will migrate again next start");
            }
            report.rules
        }
        RuleFormat::Unknown => {
            warn!(filters = %raw, "unrecognized filters format, ignoring stored filters");
            Vec::new()
        }
    }
}

/// Replace the whole stored collection
///
/// An empty collection is stored as `null`, never as `[]`.
pub fn save_rules(store: &mut impl ConfigStore, rules: &[LabeledRule]) -> Result<()> {
    let value = if rules.is_empty() {
        Value::Null
    } else {
        if !is_valid_rules(rules) {
            bail!("Refusing to save filters: every rule needs at least one criterion");
        }
        let value = rules::to_json(rules).context("Failed to serialize filters")?;
        if !is_valid(&value) {
            bail!("Refusing to save filters: serialized filters failed validation");
        }
        value
    };

    store
        .set(FILTERS_KEY, value)
        .context("Failed to store filters")?;
    store
        .set(FORMAT_KEY, Value::from(LABELED_FORMAT))
        .context("Failed to store filters format")?;
    info!(count = rules.len(), "saved filters");
    Ok(())
}

/// Load rules for an edit that will rewrite the stored collection
///
/// Fails instead of returning no rules when the stored value is in an
/// unrecognized shape, so an edit never replaces filters the user still has
/// to repair.
fn load_rules_for_edit(store: &mut impl ConfigStore) -> Result<Vec<LabeledRule>> {
    if let Some(raw) = store.get(FILTERS_KEY)
        && !raw.is_null()
    {
        let marked = store
            .get(FORMAT_KEY)
            .is_some_and(|marker| marker.as_str() == Some(LABELED_FORMAT));
        if !marked && detect(&raw) == RuleFormat::Unknown {
            bail!(
                "Stored filters are in an unrecognized format; fix or clear the `{FILTERS_KEY}` entry in the config before editing filters"
            );
        }
    }
    Ok(load_rules(store))
}

/// Append a rule; the label is synthesized when none is given
pub fn add_rule(
    store: &mut impl ConfigStore,
    body: RuleBody,
    label: Option<String>,
) -> Result<LabeledRule> {
    if body.is_empty() {
        bail!("A filter needs at least one criterion");
    }
    let mut rules = load_rules_for_edit(store)?;
    let rule = LabeledRule::new(label.unwrap_or_else(|| synthesize(&body)), body);
    rules.push(rule.clone());
    save_rules(store, &rules)?;
    info!(label = %rule.label, "added filter");
    Ok(rule)
}

pub fn remove_rule(store: &mut impl ConfigStore, index: usize) -> Result<LabeledRule> {
    let mut rules = load_rules_for_edit(store)?;
    if index >= rules.len() {
        bail!("No filter at index {index} ({} configured)", rules.len());
    }
    let removed = rules.remove(index);
    save_rules(store, &rules)?;
    info!(index, label = %removed.label, "removed filter");
    Ok(removed)
}

pub fn relabel_rule(store: &mut impl ConfigStore, index: usize, label: String) -> Result<()> {
    let mut rules = load_rules_for_edit(store)?;
    let Some(rule) = rules.get_mut(index) else {
        bail!("No filter at index {index} ({} configured)", rules.len());
    };
    rule.label = label;
    save_rules(store, &rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use serde_json::json;

    /// Store that refuses every write
    struct ReadOnlyStore(MemoryStore);

    impl ConfigStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Option<Value> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: Value) -> Result<()> {
            bail!("read-only")
        }
    }

    #[test]
    fn test_default_rules_are_complete_and_valid() {
        let rules = default_rules();
        assert_eq!(rules.len(), DEFAULT_RULES.len());
        assert!(is_valid(&rules::to_json(&rules).unwrap()));
        assert_eq!(rules[0].label, "Dock excluded");
        assert_eq!(rules[3].label, "empty Finder windows excluded");
    }

    #[test]
    fn test_first_run_seeds_defaults() {
        let mut store = MemoryStore::new();
        let rules = load_rules(&mut store);
        assert_eq!(rules, default_rules());
        assert_eq!(store.get(FORMAT_KEY), Some(json!(LABELED_FORMAT)));
        assert!(is_valid(&store.get(FILTERS_KEY).unwrap()));
    }

    #[test]
    fn test_legacy_is_migrated_and_persisted_once() {
        let mut store = MemoryStore::new().with(
            FILTERS_KEY,
            json!([
                [{"property": "ownerName", "is": "Dock"}],
                [{"property": "bogus", "is": 1}]
            ]),
        );

        let rules = load_rules(&mut store);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].label, "Dock excluded");
        assert_eq!(
            store.get(FILTERS_KEY),
            Some(json!([{"label": "Dock excluded", "filters": [{"property": "ownerName", "is": "Dock"}]}]))
        );
        assert_eq!(store.get(FORMAT_KEY), Some(json!(LABELED_FORMAT)));

        assert_eq!(load_rules(&mut store), rules);
    }

    #[test]
    fn test_legacy_with_nothing_valid_clears_filters() {
        let mut store = MemoryStore::new().with(FILTERS_KEY, json!([[{"property": "bogus", "is": 1}]]));
        assert!(load_rules(&mut store).is_empty());
        assert_eq!(store.get(FILTERS_KEY), Some(Value::Null));
        assert!(load_rules(&mut store).is_empty());
    }

    #[test]
    fn test_marker_prevents_legacy_path() {
        let mut store = MemoryStore::new()
            .with(FILTERS_KEY, json!([[{"property": "ownerName", "is": "Dock"}]]))
            .with(FORMAT_KEY, json!(LABELED_FORMAT));
        assert!(load_rules(&mut store).is_empty());
    }

    #[test]
    fn test_labeled_without_marker_gets_marked() {
        let stored = json!([{"label": "mine", "filters": [{"property": "width", "is": 0}]}]);
        let mut store = MemoryStore::new().with(FILTERS_KEY, stored.clone());
        let rules = load_rules(&mut store);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].label, "mine");
        assert_eq!(store.get(FORMAT_KEY), Some(json!(LABELED_FORMAT)));
        assert_eq!(store.get(FILTERS_KEY), Some(stored));
    }

    #[test]
    fn test_unknown_format_is_left_untouched() {
        let stored = json!({"ownerName": "Dock"});
        let mut store = MemoryStore::new().with(FILTERS_KEY, stored.clone());
        assert!(load_rules(&mut store).is_empty());
        assert_eq!(store.get(FILTERS_KEY), Some(stored));
        assert_eq!(store.get(FORMAT_KEY), None);
    }

    #[test]
    fn test_edits_refuse_to_overwrite_unknown_format() {
        let stored = json!({"ownerName": "Dock"});
        let mut store = MemoryStore::new().with(FILTERS_KEY, stored.clone());
        assert!(load_rules(&mut store).is_empty());

        let body = vec![Criterion::new(Property::Width, 1).unwrap()];
        assert!(add_rule(&mut store, body, None).is_err());
        assert!(remove_rule(&mut store, 0).is_err());
        assert!(relabel_rule(&mut store, 0, "renamed".to_string()).is_err());
        assert_eq!(store.get(FILTERS_KEY), Some(stored));
        assert_eq!(store.get(FORMAT_KEY), None);
    }

    #[test]
    fn test_edits_after_user_cleared_filters() {
        let mut store = MemoryStore::new().with(FILTERS_KEY, json!([]));
        let body = vec![Criterion::new(Property::Width, 1).unwrap()];
        assert!(add_rule(&mut store, body.clone(), None).is_err());

        store.set(FILTERS_KEY, Value::Null).unwrap();
        assert!(add_rule(&mut store, body, None).is_ok());
        assert_eq!(load_rules(&mut store).len(), 1);
    }

    #[test]
    fn test_write_failures_do_not_stop_loading() {
        let mut store = ReadOnlyStore(
            MemoryStore::new().with(FILTERS_KEY, json!([[{"property": "ownerName", "is": "Dock"}]])),
        );
        let rules = load_rules(&mut store);
        assert_eq!(rules.len(), 1);

        let mut empty = ReadOnlyStore(MemoryStore::new());
        assert_eq!(load_rules(&mut empty), default_rules());
    }

    #[test]
    fn test_save_empty_stores_null() {
        let mut store = MemoryStore::new();
        save_rules(&mut store, &[]).unwrap();
        assert_eq!(store.get(FILTERS_KEY), Some(Value::Null));
    }

    #[test]
    fn test_save_refuses_empty_body() {
        let mut store = MemoryStore::new();
        let result = save_rules(&mut store, &[LabeledRule::new("nothing", vec![])]);
        assert!(result.is_err());
        assert_eq!(store.get(FILTERS_KEY), None);
    }

    #[test]
    fn test_add_remove_relabel() {
        let mut store = MemoryStore::new().with(FILTERS_KEY, Value::Null);

        let body = vec![
            Criterion::new(Property::OwnerName, "Slack").unwrap(),
            Criterion::new(Property::IsOnscreen, false).unwrap(),
        ];
        let added = add_rule(&mut store, body, None).unwrap();
        assert_eq!(added.label, "Slack offscreen windows excluded");

        let custom = vec![Criterion::new(Property::Width, 1).unwrap()];
        add_rule(&mut store, custom, Some("thin".to_string())).unwrap();
        assert_eq!(load_rules(&mut store).len(), 2);

        relabel_rule(&mut store, 1, "very thin".to_string()).unwrap();
        assert_eq!(load_rules(&mut store)[1].label, "very thin");

        assert!(remove_rule(&mut store, 5).is_err());
        let removed = remove_rule(&mut store, 0).unwrap();
        assert_eq!(removed, added);

        remove_rule(&mut store, 0).unwrap();
        assert_eq!(store.get(FILTERS_KEY), Some(Value::Null));
        assert!(add_rule(&mut store, vec![], None).is_err());
    }
}
