//! Window filtering engine
//!
//! Pure, stateless functions over in-memory values:
//! - **schema**: property registry, typed criteria, `validate`
//! - **format**: legacy/labeled detection of persisted rules
//! - **matcher**: the exclusion predicate applied to each window
//! - **label** / **phrases**: human-readable rule labels
//! - **migrate**: legacy → labeled upgrade with per-item recovery
//! - **validate**: structural check of labeled collections

pub mod format;
pub mod label;
pub mod matcher;
pub mod migrate;
pub mod phrases;
pub mod rules;
pub mod schema;
pub mod validate;

pub use format::{RuleFormat, detect};
pub use label::{synthesize, synthesize_with};
pub use matcher::{excluded, visible};
pub use migrate::{MigrationReport, SkipReason, migrate, migrate_with_report};
pub use phrases::PhraseBook;
pub use rules::{LabeledRule, RuleBody};
pub use schema::{Criterion, CriterionError, FilterValue, Property, ValueKind, validate};
pub use validate::{is_valid, is_valid_rules};
