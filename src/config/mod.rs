//! Configuration management for taskbar-filter
//!
//! - **store**: the injected key/value store (`ConfigStore`) and its JSON file
//!   and in-memory implementations
//! - **rules**: loading, migrating and saving the filter rules kept in a store

pub mod rules;
pub mod store;

pub use rules::{add_rule, default_rules, load_rules, relabel_rule, remove_rule, save_rules};
pub use store::{ConfigStore, JsonFileStore, MemoryStore};
