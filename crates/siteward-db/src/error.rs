//! Database-specific error types and conversions.

use siteward_core::error::SitewardError;
use surrealdb_types::QueryError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(surrealdb::Error),

    /// A UNIQUE index rejected the write.
    #[error("Unique index {index} violated")]
    UniqueViolation { index: String },

    /// A concurrent transaction committed first; the write can be re-run.
    #[error("Write conflict: {0}")]
    WriteConflict(surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<surrealdb::Error> for DbError {
    fn from(err: surrealdb::Error) -> Self {
        if err.query_details() == Some(&QueryError::TransactionConflict) {
            return DbError::WriteConflict(err);
        }
        // Index violations carry no structured details, only the message.
        match unique_index_name(err.message()) {
            Some(index) => DbError::UniqueViolation { index },
            None => DbError::Surreal(err),
        }
    }
}

/// Extract the index name from a SurrealDB unique-index error message,
/// e.g. "Database index `idx_site_alias` already contains 's1', ...".
fn unique_index_name(message: &str) -> Option<String> {
    if !message.contains("already contains") {
        return None;
    }
    let start = message.find("index `")? + "index `".len();
    let len = message[start..].find('`')?;
    Some(message[start..start + len].to_string())
}

/// Map a unique index to the entity and field it guards.
fn guarded_field(index: &str) -> (&'static str, &'static str) {
    match index {
        "idx_site_folder_key" => ("site", "folder_name"),
        "idx_site_alias" => ("site", "alias_id"),
        "idx_site_host_name" => ("site_host", "host_name"),
        _ => ("unknown", "unknown"),
    }
}

impl From<DbError> for SitewardError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SitewardError::NotFound { entity, id },
            DbError::UniqueViolation { index } => {
                let (entity, field) = guarded_field(&index);
                SitewardError::AlreadyExists {
                    entity: entity.into(),
                    field: field.into(),
                }
            }
            other => SitewardError::Database(other.to_string()),
        }
    }
}
