//! Window filtering for a desktop taskbar
//!
//! The [`filter`] engine decides which windows a taskbar shows from a set of
//! user-editable exclusion rules and upgrades old rule collections to the
//! labeled format. [`config`] persists the rules, [`x11_utils`] produces the
//! window records they are applied to.

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod filter;
pub mod window;
pub mod x11_utils;
