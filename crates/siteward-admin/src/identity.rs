//! Tenant identity resolution.
//!
//! Decides whether a folder name, host name or alias may be assigned to a
//! site, and performs the assignment side effects. Availability checks
//! are an optimistic pre-check for a friendly error; the store's unique
//! indexes remain authoritative, and a violation there is reported as the
//! same "taken" error.
//!
//! The resolver holds no state between calls. Every operation is a short
//! read-then-write sequence against the repositories.

use siteward_core::error::{SitewardError, SitewardResult};
use siteward_core::models::host::{CreateSiteHost, SiteHost};
use siteward_core::models::site::Site;
use siteward_core::repository::{SiteHostRepository, SiteRepository};
use tracing::debug;
use uuid::Uuid;

use crate::error::AdminError;

/// Trim and lower-case a folder name. `None` when nothing is left.
pub fn normalize_folder_name(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Reduce raw user input (possibly a pasted URL) to a bare host name.
///
/// Host names are case-insensitive and stored lower case. A leading
/// `https://` is stripped, then a leading `http://`, once each.
pub fn normalize_host_name(candidate: &str) -> Option<String> {
    let lowered = candidate.trim().to_lowercase();
    let host = lowered.strip_prefix("https://").unwrap_or(&lowered);
    let host = host.strip_prefix("http://").unwrap_or(host).trim();
    (!host.is_empty()).then(|| host.to_string())
}

/// Alias for the next site, given how many sites already exist.
///
/// Not unique under concurrent creation; callers re-check with
/// [`TenantIdentityResolver::is_alias_available`].
pub fn next_alias_id(existing_site_count: u64) -> String {
    format!("s{}", existing_site_count + 1)
}

/// Outcome of [`TenantIdentityResolver::assign_host_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAssignment {
    /// A new mapping was inserted.
    Created(SiteHost),
    /// The site already owned the host; nothing changed.
    AlreadyMapped(SiteHost),
}

impl HostAssignment {
    pub fn host(&self) -> &SiteHost {
        match self {
            HostAssignment::Created(host) | HostAssignment::AlreadyMapped(host) => host,
        }
    }

    pub fn host_name(&self) -> &str {
        &self.host().host_name
    }
}

/// Outcome of [`TenantIdentityResolver::remove_host_mapping`].
#[derive(Debug, Clone)]
pub struct RemovedHost {
    pub host: SiteHost,
    /// The removed host was the site's preferred host, which has been
    /// cleared on the in-memory site. The caller must persist the site.
    pub preferred_cleared: bool,
}

/// Availability checks and assignment for site folder names, host names
/// and aliases.
#[derive(Clone)]
pub struct TenantIdentityResolver<S: SiteRepository, H: SiteHostRepository> {
    sites: S,
    hosts: H,
}

impl<S: SiteRepository, H: SiteHostRepository> TenantIdentityResolver<S, H> {
    pub fn new(sites: S, hosts: H) -> Self {
        Self { sites, hosts }
    }

    pub fn sites(&self) -> &S {
        &self.sites
    }

    pub fn hosts(&self) -> &H {
        &self.hosts
    }

    /// True iff the folder name is non-empty and no site other than
    /// `exclude` owns it.
    pub async fn is_folder_name_available(
        &self,
        exclude: Option<Uuid>,
        candidate: &str,
    ) -> SitewardResult<bool> {
        let Some(folder) = normalize_folder_name(candidate) else {
            return Ok(false);
        };
        let owner = self.sites.find_by_folder_name(&folder).await?;
        Ok(owner.is_none_or(|site| Some(site.id) == exclude))
    }

    /// True iff the host name is non-empty and not mapped to any site
    /// other than `exclude`.
    pub async fn is_host_name_available(
        &self,
        exclude: Option<Uuid>,
        candidate: &str,
    ) -> SitewardResult<bool> {
        let Some(host_name) = normalize_host_name(candidate) else {
            return Ok(false);
        };
        let mapping = self.hosts.find_by_host_name(&host_name).await?;
        Ok(mapping.is_none_or(|host| Some(host.site_id) == exclude))
    }

    /// True iff the alias is non-empty and no site other than `exclude`
    /// carries it.
    pub async fn is_alias_available(
        &self,
        exclude: Option<Uuid>,
        candidate: &str,
    ) -> SitewardResult<bool> {
        let alias = candidate.trim();
        if alias.is_empty() {
            return Ok(false);
        }
        let owner = self.sites.find_by_alias_id(alias).await?;
        Ok(owner.is_none_or(|site| Some(site.id) == exclude))
    }

    /// Validate a folder name for the site `site_id` and return the value
    /// to store. Only the server admin site may be left without a folder.
    pub async fn resolve_folder_name(
        &self,
        site_id: Uuid,
        is_server_admin_site: bool,
        candidate: &str,
    ) -> SitewardResult<Option<String>> {
        let Some(folder) = normalize_folder_name(candidate) else {
            if is_server_admin_site {
                return Ok(None);
            }
            return Err(AdminError::FolderRequired.into());
        };

        if !self.is_folder_name_available(Some(site_id), &folder).await? {
            return Err(AdminError::FolderTaken.into());
        }
        Ok(Some(folder))
    }

    /// Assign a folder name to `site` in memory. The caller persists it.
    pub async fn assign_folder_name(&self, site: &mut Site, candidate: &str) -> SitewardResult<()> {
        site.folder_name = self
            .resolve_folder_name(site.id, site.is_server_admin_site, candidate)
            .await?;
        Ok(())
    }

    /// Map a host name to `site`.
    ///
    /// Idempotent for a host the site already owns. Does not touch
    /// `preferred_host_name`; setting it is a separate caller step.
    pub async fn assign_host_name(
        &self,
        site: &Site,
        candidate: &str,
    ) -> SitewardResult<HostAssignment> {
        let host_name = normalize_host_name(candidate).ok_or(AdminError::HostRequired)?;

        if let Some(existing) = self.hosts.find_by_host_name(&host_name).await? {
            return self.owned_or_taken(site.id, existing);
        }

        let created = self
            .hosts
            .create(CreateSiteHost {
                site_id: site.id,
                host_name: host_name.clone(),
            })
            .await;

        match created {
            Ok(host) => {
                debug!(site_id = %site.id, host = %host.host_name, "Mapped host name");
                Ok(HostAssignment::Created(host))
            }
            // Lost a race: whoever won decides the answer.
            Err(err) if err.is_conflict_on("host_name") => {
                match self.hosts.find_by_host_name(&host_name).await? {
                    Some(existing) => self.owned_or_taken(site.id, existing),
                    None => Err(AdminError::HostTaken.into()),
                }
            }
            Err(err) => Err(err),
        }
    }

    fn owned_or_taken(&self, site_id: Uuid, existing: SiteHost) -> SitewardResult<HostAssignment> {
        if existing.site_id == site_id {
            Ok(HostAssignment::AlreadyMapped(existing))
        } else {
            Err(AdminError::HostTaken.into())
        }
    }

    /// Delete one of `site`'s host mappings, clearing the in-memory
    /// preferred host when it pointed at the removed mapping.
    ///
    /// The caller must persist `site` right after when
    /// [`RemovedHost::preferred_cleared`] is set.
    pub async fn remove_host_mapping(
        &self,
        site: &mut Site,
        host_id: Uuid,
    ) -> SitewardResult<RemovedHost> {
        let host = self
            .hosts
            .list_by_site(site.id)
            .await?
            .into_iter()
            .find(|h| h.id == host_id)
            .ok_or_else(|| SitewardError::NotFound {
                entity: "site_host".into(),
                id: host_id.to_string(),
            })?;

        self.hosts.delete(site.id, host.id).await?;

        let preferred_cleared = site.preferred_host_name.as_deref() == Some(host.host_name.as_str());
        if preferred_cleared {
            site.preferred_host_name = None;
        }
        debug!(site_id = %site.id, host = %host.host_name, preferred_cleared, "Removed host mapping");

        Ok(RemovedHost {
            host,
            preferred_cleared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_prefixes_are_stripped() {
        for raw in ["https://example.com", "http://example.com", "example.com"] {
            assert_eq!(normalize_host_name(raw).as_deref(), Some("example.com"));
        }
        assert_eq!(
            normalize_host_name("  HTTPS://Example.COM ").as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn scheme_prefixes_are_stripped_once_each_in_order() {
        assert_eq!(
            normalize_host_name("https://http://example.com").as_deref(),
            Some("example.com")
        );
        assert_eq!(
            normalize_host_name("http://https://example.com").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(normalize_host_name("https://"), None);
    }

    #[test]
    fn blank_folder_normalizes_to_none() {
        assert_eq!(normalize_folder_name(""), None);
        assert_eq!(normalize_folder_name("   "), None);
        assert_eq!(normalize_folder_name(" Blog ").as_deref(), Some("blog"));
    }

    #[test]
    fn alias_follows_site_count() {
        assert_eq!(next_alias_id(0), "s1");
        assert_eq!(next_alias_id(4), "s5");
    }
}
