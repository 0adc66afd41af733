//! Siteward Database: SurrealDB connection management, schema
//! migrations and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations for the `siteward-core` traits
//! - Error types ([`DbError`])
//!
//! The identity invariants (unique folder name, alias and host name) are
//! enforced here with UNIQUE indexes; a violation surfaces as
//! [`siteward_core::error::SitewardError::AlreadyExists`].

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
