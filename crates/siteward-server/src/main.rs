//! Siteward Server: application entry point.
//!
//! Loads configuration, installs logging (JSON to stdout plus the database
//! log sink), migrates the store and makes sure the server admin site
//! exists.

mod config;

use std::path::PathBuf;

use anyhow::Context;
use siteward_admin::SiteAdminService;
use siteward_db::repository::{
    SurrealLogRepository, SurrealSiteHostRepository, SurrealSiteRepository,
};
use siteward_db::{DbManager, run_migrations};
use siteward_telemetry::{DbLogLayer, spawn_log_writer};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{CONFIG_PATH_ENV, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
    let config = ServerConfig::load(config_path.as_deref())?;

    let db = DbManager::connect(&config.database)
        .await
        .context("connecting to SurrealDB")?;
    run_migrations(db.client())
        .await
        .context("running migrations")?;

    let (db_log_layer, log_rx) =
        DbLogLayer::channel(&config.log_sink).context("configuring database log sink")?;
    let log_writer = spawn_log_writer(SurrealLogRepository::new(db.client().clone()), log_rx);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("siteward=info".parse()?))
        .with(tracing_subscriber::fmt::layer().json())
        .with(db_log_layer)
        .init();

    tracing::info!(
        mode = ?config.admin.multi_tenant_mode,
        "Starting siteward server..."
    );

    let admin = SiteAdminService::new(
        SurrealSiteRepository::new(db.client().clone()),
        SurrealSiteHostRepository::new(db.client().clone()),
        config.admin.clone(),
    );
    if let Some(site) = admin
        .ensure_primary_site((&config.primary_site).into())
        .await?
    {
        tracing::info!(site_id = %site.id, name = %site.site_name, "Bootstrapped server admin site");
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("siteward server stopped.");

    // The global subscriber keeps the log sender alive, so the writer is
    // aborted rather than drained.
    log_writer.abort();
    Ok(())
}
