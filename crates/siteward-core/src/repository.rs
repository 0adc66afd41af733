//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Lookups that the identity checks
//! depend on return `Option` rather than a `NotFound` error, since absence
//! is the common, expected answer there.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::SitewardResult;
use crate::models::{
    host::{CreateSiteHost, SiteHost},
    log_entry::{CreateLogEntry, LogEntry},
    site::{CreateSite, Site, UpdateSite},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

impl Pagination {
    /// Build from a 1-based page number. Page numbers below 1 are
    /// treated as the first page.
    pub fn from_page(page_number: u64, page_size: u64) -> Self {
        Self {
            offset: page_number.saturating_sub(1) * page_size,
            limit: page_size,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Sites (global scope)
// ---------------------------------------------------------------------------

pub trait SiteRepository: Send + Sync {
    /// Insert a new site. Fails with `AlreadyExists` when the folder name
    /// or alias collides with another site.
    fn create(&self, input: CreateSite) -> impl Future<Output = SitewardResult<Site>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SitewardResult<Site>> + Send;
    /// Case-insensitive lookup by folder name.
    fn find_by_folder_name(
        &self,
        folder_name: &str,
    ) -> impl Future<Output = SitewardResult<Option<Site>>> + Send;
    fn find_by_alias_id(
        &self,
        alias_id: &str,
    ) -> impl Future<Output = SitewardResult<Option<Site>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateSite,
    ) -> impl Future<Output = SitewardResult<Site>> + Send;
    /// Hard-delete the site together with its host mappings.
    fn delete(&self, id: Uuid) -> impl Future<Output = SitewardResult<()>> + Send;
    /// Number of sites other than `exclude` (all sites when `None`).
    fn count_other_sites(
        &self,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = SitewardResult<u64>> + Send;
    fn list_other_sites(
        &self,
        exclude: Option<Uuid>,
        pagination: Pagination,
    ) -> impl Future<Output = SitewardResult<PaginatedResult<Site>>> + Send;
}

pub trait SiteHostRepository: Send + Sync {
    fn find_by_host_name(
        &self,
        host_name: &str,
    ) -> impl Future<Output = SitewardResult<Option<SiteHost>>> + Send;
    fn list_by_site(
        &self,
        site_id: Uuid,
    ) -> impl Future<Output = SitewardResult<Vec<SiteHost>>> + Send;
    /// Insert a mapping. Fails with `AlreadyExists` when any site already
    /// owns the host name.
    fn create(&self, input: CreateSiteHost)
    -> impl Future<Output = SitewardResult<SiteHost>> + Send;
    fn delete(&self, site_id: Uuid, host_id: Uuid)
    -> impl Future<Output = SitewardResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Application log (global scope, append-mostly)
// ---------------------------------------------------------------------------

pub trait LogRepository: Send + Sync {
    fn create(&self, input: CreateLogEntry)
    -> impl Future<Output = SitewardResult<LogEntry>> + Send;
    /// Newest entries first.
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = SitewardResult<PaginatedResult<LogEntry>>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = SitewardResult<()>> + Send;
    fn delete_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = SitewardResult<()>> + Send;
    fn delete_all(&self) -> impl Future<Output = SitewardResult<()>> + Send;
}
