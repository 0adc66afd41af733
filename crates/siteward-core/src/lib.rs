//! Siteward Core: domain models, repository traits and the error
//! taxonomy shared by every other siteward crate.

pub mod error;
pub mod models;
pub mod repository;
