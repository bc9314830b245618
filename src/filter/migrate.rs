//! Legacy → labeled rule migration
//!
//! Best effort: every legacy rule body is converted on its own, and a body
//! that cannot be converted is skipped without affecting the others. The
//! result may therefore be shorter than the input.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::label::synthesize;
use super::rules::LabeledRule;
use super::schema::{Criterion, json_type_name};

/// Why a legacy rule body produced no labeled rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAnArray(&'static str),
    Empty,
    NoValidCriteria { dropped: usize },
}

/// Outcome of converting one legacy rule body
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Keep { rule: LabeledRule, dropped: usize },
    Skip(SkipReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub rules: Vec<LabeledRule>,
    /// Invalid criteria removed from bodies that were otherwise kept
    pub dropped_criteria: usize,
    /// Legacy bodies that produced no rule, with their input index
    pub skipped: Vec<(usize, SkipReason)>,
}

impl MigrationReport {
    pub fn is_lossless(&self) -> bool {
        self.dropped_criteria == 0 && self.skipped.is_empty()
    }
}

pub fn migrate(legacy: &Value) -> Vec<LabeledRule> {
    migrate_with_report(legacy).rules
}

pub fn migrate_with_report(legacy: &Value) -> MigrationReport {
    let Some(bodies) = legacy.as_array() else {
        warn!(found = json_type_name(legacy), "legacy filters are not an array, nothing to migrate");
        return MigrationReport::default();
    };

    let report = bodies
        .iter()
        .enumerate()
        .map(|(index, body)| (index, migrate_body(index, body)))
        .fold(MigrationReport::default(), |mut report, (index, step)| {
            match step {
                Step::Keep { rule, dropped } => {
                    report.dropped_criteria += dropped;
                    report.rules.push(rule);
                }
                Step::Skip(reason) => {
                    warn!(index, reason = ?reason, "skipping legacy filter group");
                    report.skipped.push((index, reason));
                }
            }
            report
        });

    info!(
        input = bodies.len(),
        migrated = report.rules.len(),
        skipped = report.skipped.len(),
        dropped_criteria = report.dropped_criteria,
        "migrated legacy filters"
    );
    report
}

fn migrate_body(index: usize, body: &Value) -> Step {
    let criteria = match body {
        Value::Array(criteria) if criteria.is_empty() => return Step::Skip(SkipReason::Empty),
        Value::Array(criteria) => criteria,
        other => return Step::Skip(SkipReason::NotAnArray(json_type_name(other))),
    };

    let mut dropped = 0;
    let survivors: Vec<Criterion> = criteria
        .iter()
        .filter_map(|raw| {
            Criterion::from_legacy(raw)
                .inspect_err(|e| {
                    dropped += 1;
                    warn!(index, criterion = %raw, error = %e, "dropping invalid legacy criterion");
                })
                .ok()
        })
        .collect();

    if survivors.is_empty() {
        return Step::Skip(SkipReason::NoValidCriteria { dropped });
    }

    let label = synthesize(&survivors);
    debug!(index, label = %label, criteria = survivors.len(), "labeled legacy filter group");
    Step::Keep {
        rule: LabeledRule::new(label, survivors),
        dropped,
    }
}
