//! Error types for the siteward system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SitewardError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A store-level uniqueness constraint rejected the write.
    #[error("Entity already exists: {entity} ({field})")]
    AlreadyExists { entity: String, field: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl SitewardError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True when the error is a uniqueness violation on `field`.
    pub fn is_conflict_on(&self, field: &str) -> bool {
        matches!(self, Self::AlreadyExists { field: f, .. } if f == field)
    }
}

pub type SitewardResult<T> = Result<T, SitewardError>;
