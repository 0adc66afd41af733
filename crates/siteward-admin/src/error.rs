//! Administration error types.

use siteward_core::error::SitewardError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("folder required")]
    FolderRequired,

    #[error("folder taken")]
    FolderTaken,

    #[error("host required")]
    HostRequired,

    #[error("host taken")]
    HostTaken,

    #[error("alias taken")]
    AliasTaken,

    #[error("site name required")]
    SiteNameRequired,

    #[error("only the server admin site may manage other sites")]
    NotServerAdmin,

    #[error("the server admin site cannot be deleted")]
    ServerAdminSiteUndeletable,

    #[error("deleting sites is disabled")]
    DeleteDisabled,
}

impl AdminError {
    /// Form field the error is reported against.
    pub fn field(&self) -> &'static str {
        match self {
            AdminError::FolderRequired | AdminError::FolderTaken => "folder_name",
            AdminError::HostRequired | AdminError::HostTaken => "host_name",
            AdminError::AliasTaken => "alias_id",
            AdminError::SiteNameRequired => "site_name",
            AdminError::NotServerAdmin
            | AdminError::ServerAdminSiteUndeletable
            | AdminError::DeleteDisabled => "site_id",
        }
    }
}

impl From<AdminError> for SitewardError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::NotServerAdmin
            | AdminError::ServerAdminSiteUndeletable
            | AdminError::DeleteDisabled => SitewardError::AuthorizationDenied {
                reason: err.to_string(),
            },
            other => SitewardError::validation(other.field(), other.to_string()),
        }
    }
}

/// Translate a store-level uniqueness violation on one of the guarded
/// identity fields into the same error the pre-check would report.
pub(crate) fn identity_conflict(err: SitewardError) -> SitewardError {
    if err.is_conflict_on("folder_name") {
        AdminError::FolderTaken.into()
    } else if err.is_conflict_on("host_name") {
        AdminError::HostTaken.into()
    } else if err.is_conflict_on("alias_id") {
        AdminError::AliasTaken.into()
    } else {
        err
    }
}
