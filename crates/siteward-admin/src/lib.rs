//! Siteward Admin: tenant identity resolution and the site
//! administration flows built on top of it.

pub mod config;
pub mod error;
pub mod identity;
pub mod service;

pub use config::{AdminConfig, MultiTenantMode};
pub use error::AdminError;
pub use identity::{HostAssignment, RemovedHost, TenantIdentityResolver};
pub use service::{
    Actor, NewSiteInput, PrimarySiteInput, SecuritySettingsView, SiteAdminService, SiteInfoInput,
    SiteInfoView,
};
