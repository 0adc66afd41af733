//! Administration configuration.

use serde::{Deserialize, Serialize};

/// How incoming requests are matched to a site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiTenantMode {
    /// First URL path segment selects the site.
    #[default]
    FolderName,
    /// Request host name selects the site.
    HostName,
}

/// Configuration for the site administration service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub multi_tenant_mode: MultiTenantMode,
    /// Whether the server admin site may delete other sites (default: false).
    pub allow_delete_child_sites: bool,
    /// Site list page size when the caller does not ask for one (default: 10).
    pub default_page_size: u64,
    /// How many successive aliases to try when the generated one is
    /// already taken (default: 16).
    pub max_alias_attempts: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            multi_tenant_mode: MultiTenantMode::FolderName,
            allow_delete_child_sites: false,
            default_page_size: 10,
            max_alias_attempts: 16,
        }
    }
}
