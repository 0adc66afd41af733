//! Siteward Telemetry: a `tracing` layer that persists log events to the
//! application log table.
//!
//! - [`DbLogLayer`] turns events into [`CreateLogEntry`] rows, attaching the
//!   request context recorded on enclosing spans.
//! - [`spawn_log_writer`] drains those rows into a [`LogRepository`] on a
//!   background task.
//! - [`format_log_values`] renders structured event fields as indented text.
//!
//! [`CreateLogEntry`]: siteward_core::models::log_entry::CreateLogEntry
//! [`LogRepository`]: siteward_core::repository::LogRepository

pub mod config;
pub mod error;
pub mod format;
pub mod layer;
pub mod writer;

pub use config::LogSinkConfig;
pub use error::TelemetryError;
pub use format::{LogValue, format_log_values};
pub use layer::{DbLogLayer, short_url};
pub use writer::spawn_log_writer;
