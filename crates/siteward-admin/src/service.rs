//! Site administration service: the create, edit and delete flows for
//! sites, their settings groups and their host mappings.
//!
//! The acting site is passed explicitly as an [`Actor`]. A site may always
//! edit itself; only the server admin site may list, create, delete or
//! edit other sites.

use serde::{Deserialize, Serialize};
use siteward_core::error::{SitewardError, SitewardResult};
use siteward_core::models::host::SiteHost;
use siteward_core::models::settings::{
    CaptchaSettings, CompanyInfo, LoginPageContent, MailSettings, RegistrationPageContent,
    SecuritySettings, SmsSettings, SocialLoginSettings,
};
use siteward_core::models::site::{CreateSite, Site, UpdateSite};
use siteward_core::repository::{
    PaginatedResult, Pagination, SiteHostRepository, SiteRepository,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AdminConfig, MultiTenantMode};
use crate::error::{AdminError, identity_conflict};
use crate::identity::{
    HostAssignment, TenantIdentityResolver, next_alias_id, normalize_host_name,
};

/// The site on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub site_id: Uuid,
    pub is_server_admin_site: bool,
}

impl Actor {
    pub fn for_site(site: &Site) -> Self {
        Self {
            site_id: site.id,
            is_server_admin_site: site.is_server_admin_site,
        }
    }

    fn require_server_admin(&self) -> Result<(), AdminError> {
        if self.is_server_admin_site {
            Ok(())
        } else {
            Err(AdminError::NotServerAdmin)
        }
    }
}

/// Basic settings screen for one site.
#[derive(Debug, Clone)]
pub struct SiteInfoView {
    pub site: Site,
    /// The actor may delete this site.
    pub show_delete: bool,
}

/// Security settings screen, with the capability checks it displays.
#[derive(Debug, Clone)]
pub struct SecuritySettingsView {
    pub site_id: Uuid,
    pub settings: SecuritySettings,
    pub email_is_configured: bool,
    pub sms_is_configured: bool,
    pub has_any_social_auth_enabled: bool,
}

/// Input for the basic settings update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteInfoInput {
    pub site_id: Uuid,
    pub site_name: String,
    pub time_zone_id: String,
    /// Used in folder-name mode.
    pub folder_name: Option<String>,
    /// Used in host-name mode; becomes the preferred host.
    pub host_name: Option<String>,
    pub is_closed: bool,
    pub closed_message: Option<String>,
    pub theme: Option<String>,
    pub google_analytics_profile_id: Option<String>,
    pub add_this_profile_id: Option<String>,
    pub forced_culture: Option<String>,
    pub forced_ui_culture: Option<String>,
}

/// Input for creating a site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSiteInput {
    pub site_name: String,
    pub time_zone_id: String,
    pub folder_name: Option<String>,
    pub host_name: Option<String>,
    pub is_closed: bool,
    pub closed_message: Option<String>,
}

/// Input for bootstrapping the server admin site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimarySiteInput {
    pub site_name: String,
    pub time_zone_id: String,
}

/// Site administration service.
///
/// Generic over repository implementations so that the admin layer
/// has no dependency on the database crate.
pub struct SiteAdminService<S: SiteRepository, H: SiteHostRepository> {
    identity: TenantIdentityResolver<S, H>,
    config: AdminConfig,
}

impl<S: SiteRepository, H: SiteHostRepository> SiteAdminService<S, H> {
    pub fn new(site_repo: S, host_repo: H, config: AdminConfig) -> Self {
        Self {
            identity: TenantIdentityResolver::new(site_repo, host_repo),
            config,
        }
    }

    pub fn identity(&self) -> &TenantIdentityResolver<S, H> {
        &self.identity
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    // -------------------------------------------------------------------
    // Site list and lookup
    // -------------------------------------------------------------------

    /// Page through every site. Server admin only.
    pub async fn list_sites(
        &self,
        actor: Actor,
        page_number: u64,
        page_size: Option<u64>,
    ) -> SitewardResult<PaginatedResult<Site>> {
        actor.require_server_admin()?;
        let page_size = page_size
            .filter(|size| *size > 0)
            .unwrap_or(self.config.default_page_size);

        self.identity
            .sites()
            .list_other_sites(None, Pagination::from_page(page_number, page_size))
            .await
    }

    /// Load the site to edit: the actor's own site when `site_id` is
    /// `None`, any site for the server admin site.
    pub async fn site_for_edit(&self, actor: Actor, site_id: Option<Uuid>) -> SitewardResult<Site> {
        let site_id = site_id.unwrap_or(actor.site_id);
        if site_id != actor.site_id {
            actor.require_server_admin()?;
        }
        self.identity.sites().get_by_id(site_id).await
    }

    pub async fn site_info(&self, actor: Actor, site_id: Option<Uuid>) -> SitewardResult<SiteInfoView> {
        let site = self.site_for_edit(actor, site_id).await?;
        let show_delete = actor.is_server_admin_site
            && site.id != actor.site_id
            && !site.is_server_admin_site
            && self.config.allow_delete_child_sites;

        Ok(SiteInfoView { site, show_delete })
    }

    // -------------------------------------------------------------------
    // Basic settings and site creation
    // -------------------------------------------------------------------

    /// Apply the basic settings form, including the folder or host name
    /// that identifies the site.
    pub async fn update_site_info(&self, actor: Actor, input: SiteInfoInput) -> SitewardResult<Site> {
        if input.site_name.trim().is_empty() {
            return Err(AdminError::SiteNameRequired.into());
        }
        let mut site = self.site_for_edit(actor, Some(input.site_id)).await?;

        let mut update = UpdateSite {
            site_name: Some(input.site_name),
            time_zone_id: Some(input.time_zone_id),
            is_closed: Some(input.is_closed),
            closed_message: Some(input.closed_message),
            theme: Some(input.theme),
            google_analytics_profile_id: Some(input.google_analytics_profile_id),
            add_this_profile_id: Some(input.add_this_profile_id),
            forced_culture: Some(input.forced_culture),
            forced_ui_culture: Some(input.forced_ui_culture),
            ..Default::default()
        };

        match self.config.multi_tenant_mode {
            MultiTenantMode::FolderName => {
                let candidate = input.folder_name.unwrap_or_default();
                self.identity.assign_folder_name(&mut site, &candidate).await?;
                update.folder_name = Some(site.folder_name.clone());
            }
            MultiTenantMode::HostName => {
                // Mapping the host and preferring it are separate steps.
                let preferred = match input.host_name.as_deref().and_then(normalize_host_name) {
                    Some(host_name) => {
                        let assignment = self.identity.assign_host_name(&site, &host_name).await?;
                        Some(assignment.host_name().to_string())
                    }
                    None => None,
                };
                update.preferred_host_name = Some(preferred);
            }
        }

        let site = self
            .identity
            .sites()
            .update(site.id, update)
            .await
            .map_err(identity_conflict)?;

        info!(site_id = %site.id, "Updated basic site settings");
        Ok(site)
    }

    /// Create a new site. Server admin only.
    ///
    /// In host-name mode the mapping is inserted after the site row; if
    /// that insert loses a race the new site is removed again.
    pub async fn create_site(&self, actor: Actor, input: NewSiteInput) -> SitewardResult<Site> {
        actor.require_server_admin()?;
        if input.site_name.trim().is_empty() {
            return Err(AdminError::SiteNameRequired.into());
        }

        let id = Uuid::new_v4();
        let mut folder_name = None;
        let mut host_name = None;

        match self.config.multi_tenant_mode {
            MultiTenantMode::FolderName => {
                let candidate = input.folder_name.unwrap_or_default();
                folder_name = self.identity.resolve_folder_name(id, false, &candidate).await?;
            }
            MultiTenantMode::HostName => {
                if let Some(host) = input.host_name.as_deref().and_then(normalize_host_name) {
                    if !self.identity.is_host_name_available(None, &host).await? {
                        return Err(AdminError::HostTaken.into());
                    }
                    host_name = Some(host);
                }
            }
        }

        let template = CreateSite {
            id,
            alias_id: String::new(),
            site_name: input.site_name,
            folder_name,
            preferred_host_name: host_name.clone(),
            is_server_admin_site: false,
            time_zone_id: input.time_zone_id,
            is_closed: input.is_closed,
            closed_message: input.closed_message,
        };
        let site = self.create_with_free_alias(template).await?;

        if let Some(host) = host_name {
            if let Err(err) = self.identity.assign_host_name(&site, &host).await {
                warn!(site_id = %site.id, host = %host, error = %err, "Host mapping failed, removing new site");
                self.identity.sites().delete(site.id).await?;
                return Err(err);
            }
        }

        info!(
            site_id = %site.id,
            alias = %site.alias_id,
            folder = ?site.folder_name,
            host = ?site.preferred_host_name,
            "Created site"
        );
        Ok(site)
    }

    /// Insert `template` under the first alias from `next_alias_id(count)`
    /// that the store accepts. A concurrent create may claim a candidate
    /// between the availability check and the insert; the unique index
    /// rejects it and the next candidate is tried.
    async fn create_with_free_alias(&self, template: CreateSite) -> SitewardResult<Site> {
        let sites = self.identity.sites();
        let count = sites.count_other_sites(None).await?;
        for offset in 0..u64::from(self.config.max_alias_attempts) {
            let candidate = next_alias_id(count + offset);
            if !self.identity.is_alias_available(None, &candidate).await? {
                debug!(alias = %candidate, "Alias in use, trying next");
                continue;
            }
            let input = CreateSite {
                alias_id: candidate.clone(),
                ..template.clone()
            };
            match sites.create(input).await {
                Ok(site) => return Ok(site),
                Err(err) if err.is_conflict_on("alias_id") => {
                    debug!(alias = %candidate, "Alias claimed concurrently, trying next");
                }
                Err(err) => return Err(identity_conflict(err)),
            }
        }
        Err(AdminError::AliasTaken.into())
    }

    /// Create the server admin site when the store holds no sites yet.
    ///
    /// Returns the new site, or `None` if any site already exists.
    pub async fn ensure_primary_site(&self, input: PrimarySiteInput) -> SitewardResult<Option<Site>> {
        let sites = self.identity.sites();
        let count = sites.count_other_sites(None).await?;
        if count > 0 {
            return Ok(None);
        }

        let site = sites
            .create(CreateSite {
                id: Uuid::new_v4(),
                alias_id: next_alias_id(count),
                site_name: input.site_name,
                folder_name: None,
                preferred_host_name: None,
                is_server_admin_site: true,
                time_zone_id: input.time_zone_id,
                is_closed: false,
                closed_message: None,
            })
            .await
            .map_err(identity_conflict)?;

        info!(site_id = %site.id, alias = %site.alias_id, "Created server admin site");
        Ok(Some(site))
    }

    // -------------------------------------------------------------------
    // Remote validation queries
    // -------------------------------------------------------------------

    pub async fn alias_available(&self, site_id: Option<Uuid>, alias_id: &str) -> SitewardResult<bool> {
        self.identity.is_alias_available(site_id, alias_id).await
    }

    pub async fn folder_name_available(
        &self,
        site_id: Option<Uuid>,
        folder_name: &str,
    ) -> SitewardResult<bool> {
        self.identity.is_folder_name_available(site_id, folder_name).await
    }

    pub async fn host_name_available(
        &self,
        site_id: Option<Uuid>,
        host_name: &str,
    ) -> SitewardResult<bool> {
        self.identity.is_host_name_available(site_id, host_name).await
    }

    // -------------------------------------------------------------------
    // Settings groups
    // -------------------------------------------------------------------

    async fn update_group(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
        group: &'static str,
        update: UpdateSite,
    ) -> SitewardResult<Site> {
        let site = self.site_for_edit(actor, site_id).await?;
        let site = self.identity.sites().update(site.id, update).await?;
        debug!(site_id = %site.id, group, "Updated site settings");
        Ok(site)
    }

    pub async fn update_company_info(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
        company: CompanyInfo,
    ) -> SitewardResult<Site> {
        let update = UpdateSite {
            company: Some(company),
            ..Default::default()
        };
        self.update_group(actor, site_id, "company", update).await
    }

    pub async fn update_mail_settings(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
        mail: MailSettings,
    ) -> SitewardResult<Site> {
        let update = UpdateSite {
            mail: Some(mail),
            ..Default::default()
        };
        self.update_group(actor, site_id, "mail", update).await
    }

    pub async fn update_sms_settings(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
        sms: SmsSettings,
    ) -> SitewardResult<Site> {
        let update = UpdateSite {
            sms: Some(sms),
            ..Default::default()
        };
        self.update_group(actor, site_id, "sms", update).await
    }

    pub async fn security_settings(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
    ) -> SitewardResult<SecuritySettingsView> {
        let site = self.site_for_edit(actor, site_id).await?;
        Ok(SecuritySettingsView {
            site_id: site.id,
            email_is_configured: site.mail.is_configured(),
            sms_is_configured: site.sms.is_configured(),
            has_any_social_auth_enabled: site.social.any_enabled(),
            settings: site.security,
        })
    }

    pub async fn update_security_settings(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
        security: SecuritySettings,
    ) -> SitewardResult<Site> {
        let update = UpdateSite {
            security: Some(security),
            ..Default::default()
        };
        self.update_group(actor, site_id, "security", update).await
    }

    pub async fn update_captcha_settings(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
        captcha: CaptchaSettings,
    ) -> SitewardResult<Site> {
        let update = UpdateSite {
            captcha: Some(captcha),
            ..Default::default()
        };
        self.update_group(actor, site_id, "captcha", update).await
    }

    pub async fn update_social_logins(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
        social: SocialLoginSettings,
    ) -> SitewardResult<Site> {
        let update = UpdateSite {
            social: Some(social),
            ..Default::default()
        };
        self.update_group(actor, site_id, "social", update).await
    }

    pub async fn update_login_page(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
        content: LoginPageContent,
    ) -> SitewardResult<Site> {
        let update = UpdateSite {
            login_page: Some(content),
            ..Default::default()
        };
        self.update_group(actor, site_id, "login_page", update).await
    }

    pub async fn update_registration_page(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
        content: RegistrationPageContent,
    ) -> SitewardResult<Site> {
        let update = UpdateSite {
            registration_page: Some(content),
            ..Default::default()
        };
        self.update_group(actor, site_id, "registration_page", update)
            .await
    }

    // -------------------------------------------------------------------
    // Deletion
    // -------------------------------------------------------------------

    /// Delete a child site and its host mappings. Server admin only.
    pub async fn delete_site(&self, actor: Actor, site_id: Uuid) -> SitewardResult<Site> {
        actor.require_server_admin()?;
        if !self.config.allow_delete_child_sites {
            return Err(AdminError::DeleteDisabled.into());
        }

        let site = self.identity.sites().get_by_id(site_id).await?;
        if site.is_server_admin_site {
            return Err(AdminError::ServerAdminSiteUndeletable.into());
        }

        self.identity.sites().delete(site.id).await?;
        info!(site_id = %site.id, alias = %site.alias_id, "Deleted site");
        Ok(site)
    }

    // -------------------------------------------------------------------
    // Host mappings
    // -------------------------------------------------------------------

    pub async fn host_mappings(
        &self,
        actor: Actor,
        site_id: Option<Uuid>,
    ) -> SitewardResult<Vec<SiteHost>> {
        actor.require_server_admin()?;
        let site = self.site_for_edit(actor, site_id).await?;
        self.identity.hosts().list_by_site(site.id).await
    }

    /// Map an additional host name to a site. Server admin only.
    pub async fn add_host(
        &self,
        actor: Actor,
        site_id: Uuid,
        host_name: &str,
    ) -> SitewardResult<HostAssignment> {
        actor.require_server_admin()?;
        let site = self.site_for_edit(actor, Some(site_id)).await?;
        let assignment = self.identity.assign_host_name(&site, host_name).await?;

        if let HostAssignment::Created(host) = &assignment {
            info!(site_id = %site.id, host = %host.host_name, "Added host mapping");
        }
        Ok(assignment)
    }

    /// Remove one of a site's host mappings. Server admin only.
    ///
    /// A preferred host pointing at the mapping is cleared in the store
    /// before the mapping is deleted, so a failed delete never leaves the
    /// site preferring a host it no longer owns.
    pub async fn remove_host(
        &self,
        actor: Actor,
        site_id: Uuid,
        host_name: &str,
    ) -> SitewardResult<SiteHost> {
        actor.require_server_admin()?;
        let mut site = self.site_for_edit(actor, Some(site_id)).await?;

        let not_mapped = || SitewardError::NotFound {
            entity: "site_host".into(),
            id: host_name.to_string(),
        };
        let normalized = normalize_host_name(host_name).ok_or_else(not_mapped)?;
        let host = self
            .identity
            .hosts()
            .find_by_host_name(&normalized)
            .await?
            .filter(|h| h.site_id == site.id)
            .ok_or_else(not_mapped)?;

        if site.preferred_host_name.as_deref() == Some(host.host_name.as_str()) {
            site = self
                .identity
                .sites()
                .update(
                    site.id,
                    UpdateSite {
                        preferred_host_name: Some(None),
                        ..Default::default()
                    },
                )
                .await?;
        }

        let removed = self.identity.remove_host_mapping(&mut site, host.id).await?;

        info!(site_id = %site.id, host = %removed.host.host_name, "Removed host mapping");
        Ok(removed.host)
    }
}
