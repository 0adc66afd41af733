//! Persisted application log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One application log event together with the HTTP request context it
/// was emitted under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub logged_at: DateTime<Utc>,
    pub ip_address: String,
    pub culture: String,
    pub url: String,
    /// `url` truncated to fit the indexed column.
    pub short_url: String,
    pub thread: String,
    pub log_level: String,
    /// Target (module path) of the emitting logger.
    pub logger: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLogEntry {
    pub logged_at: DateTime<Utc>,
    pub ip_address: String,
    pub culture: String,
    pub url: String,
    pub short_url: String,
    pub thread: String,
    pub log_level: String,
    pub logger: String,
    pub message: String,
}
