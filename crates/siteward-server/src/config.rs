//! Server configuration, loaded from TOML with environment overrides.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use siteward_admin::{AdminConfig, PrimarySiteInput};
use siteward_db::DbConfig;
use siteward_telemetry::LogSinkConfig;

pub const CONFIG_PATH_ENV: &str = "SITEWARD_CONFIG";
const DB_URL_ENV: &str = "SITEWARD_DB_URL";
const DB_PASSWORD_ENV: &str = "SITEWARD_DB_PASSWORD";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub database: DbConfig,
    pub admin: AdminConfig,
    pub log_sink: LogSinkConfig,
    pub primary_site: PrimarySiteConfig,
}

/// Values for the server admin site created on first start.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrimarySiteConfig {
    pub site_name: String,
    pub time_zone_id: String,
}

impl Default for PrimarySiteConfig {
    fn default() -> Self {
        Self {
            site_name: "Sample Site".into(),
            time_zone_id: "Etc/UTC".into(),
        }
    }
}

impl From<&PrimarySiteConfig> for PrimarySiteInput {
    fn from(config: &PrimarySiteConfig) -> Self {
        Self {
            site_name: config.site_name.clone(),
            time_zone_id: config.time_zone_id.clone(),
        }
    }
}

impl ServerConfig {
    /// Read `path` when given, otherwise start from defaults, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(DB_URL_ENV) {
            self.database.url = url;
        }
        if let Some(password) = lookup(DB_PASSWORD_ENV) {
            self.database.password = password;
        }
    }
}
