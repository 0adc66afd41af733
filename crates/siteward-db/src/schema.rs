//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs are stored as strings; settings groups
//! are stored as flexible objects so new keys do not need a migration.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct AppliedMigration {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "sites_hosts_log",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

// `folder_key` is the folder name when set and `#<site id>` otherwise, so
// the unique index never sees two empty keys.
const SCHEMA_V1: &str = "\
-- =======================================================================
-- Sites (global scope)
-- =======================================================================
DEFINE TABLE site SCHEMAFULL;
DEFINE FIELD alias_id ON TABLE site TYPE string;
DEFINE FIELD site_name ON TABLE site TYPE string;
DEFINE FIELD folder_name ON TABLE site TYPE option<string>;
DEFINE FIELD folder_key ON TABLE site TYPE string;
DEFINE FIELD preferred_host_name ON TABLE site TYPE option<string>;
DEFINE FIELD is_server_admin_site ON TABLE site TYPE bool DEFAULT false;
DEFINE FIELD time_zone_id ON TABLE site TYPE string;
DEFINE FIELD theme ON TABLE site TYPE option<string>;
DEFINE FIELD is_closed ON TABLE site TYPE bool DEFAULT false;
DEFINE FIELD closed_message ON TABLE site TYPE option<string>;
DEFINE FIELD google_analytics_profile_id ON TABLE site \
    TYPE option<string>;
DEFINE FIELD add_this_profile_id ON TABLE site TYPE option<string>;
DEFINE FIELD forced_culture ON TABLE site TYPE option<string>;
DEFINE FIELD forced_ui_culture ON TABLE site TYPE option<string>;
DEFINE FIELD company ON TABLE site TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD mail ON TABLE site TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD sms ON TABLE site TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD security ON TABLE site TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD captcha ON TABLE site TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD social ON TABLE site TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD login_page ON TABLE site TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD registration_page ON TABLE site TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE site TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE site TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_site_folder_key ON TABLE site \
    COLUMNS folder_key UNIQUE;
DEFINE INDEX idx_site_alias ON TABLE site COLUMNS alias_id UNIQUE;
DEFINE INDEX idx_site_name ON TABLE site COLUMNS site_name;

-- =======================================================================
-- Host name mappings (global scope, one owner per host)
-- =======================================================================
DEFINE TABLE site_host SCHEMAFULL;
DEFINE FIELD site_id ON TABLE site_host TYPE string;
DEFINE FIELD host_name ON TABLE site_host TYPE string;
DEFINE FIELD created_at ON TABLE site_host TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_site_host_name ON TABLE site_host \
    COLUMNS host_name UNIQUE;
DEFINE INDEX idx_site_host_site ON TABLE site_host COLUMNS site_id;

-- =======================================================================
-- Application log
-- =======================================================================
DEFINE TABLE log_entry SCHEMAFULL;
DEFINE FIELD logged_at ON TABLE log_entry TYPE datetime;
DEFINE FIELD ip_address ON TABLE log_entry TYPE string;
DEFINE FIELD culture ON TABLE log_entry TYPE string;
DEFINE FIELD url ON TABLE log_entry TYPE string;
DEFINE FIELD short_url ON TABLE log_entry TYPE string;
DEFINE FIELD thread ON TABLE log_entry TYPE string;
DEFINE FIELD log_level ON TABLE log_entry TYPE string;
DEFINE FIELD logger ON TABLE log_entry TYPE string;
DEFINE FIELD message ON TABLE log_entry TYPE string;
DEFINE INDEX idx_log_entry_time ON TABLE log_entry COLUMNS logged_at;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Apply every migration newer than the highest recorded version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let applied: Vec<AppliedMigration> = result.take(0)?;
    let current_version = applied.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}': {}",
                migration.version, migration.name, e
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!("recording v{}: {}", migration.version, e))
            })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(window[0].version < window[1].version);
        }
    }

    #[test]
    fn identity_fields_have_unique_indexes() {
        for index in ["idx_site_folder_key", "idx_site_alias", "idx_site_host_name"] {
            let line = SCHEMA_V1
                .split(';')
                .find(|stmt| stmt.contains(index))
                .unwrap_or_else(|| panic!("missing {index}"));
            assert!(line.contains("UNIQUE"), "{index} must be UNIQUE");
        }
    }
}
