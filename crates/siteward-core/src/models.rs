//! Domain models for siteward.
//!
//! These are the core types shared across all crates.

pub mod host;
pub mod log_entry;
pub mod site;
pub mod settings;
