//! SurrealDB implementation of [`SiteHostRepository`].

use chrono::{DateTime, Utc};
use siteward_core::error::SitewardResult;
use siteward_core::models::host::{CreateSiteHost, SiteHost};
use siteward_core::repository::SiteHostRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::retry_on_conflict;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct HostRow {
    site_id: String,
    host_name: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct HostRowWithId {
    record_id: String,
    site_id: String,
    host_name: String,
    created_at: DateTime<Utc>,
}

fn row_to_host(row: HostRow, id: Uuid) -> Result<SiteHost, DbError> {
    let site_id = Uuid::parse_str(&row.site_id)
        .map_err(|e| DbError::Decode(format!("invalid site UUID: {e}")))?;
    Ok(SiteHost {
        id,
        site_id,
        host_name: row.host_name,
        created_at: row.created_at,
    })
}

impl HostRowWithId {
    fn try_into_host(self) -> Result<SiteHost, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid host UUID: {e}")))?;
        row_to_host(
            HostRow {
                site_id: self.site_id,
                host_name: self.host_name,
                created_at: self.created_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the host mapping repository.
#[derive(Clone)]
pub struct SurrealSiteHostRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSiteHostRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn insert(&self, input: CreateSiteHost) -> Result<SiteHost, DbError> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('site_host', $id) SET \
                 site_id = $site_id, host_name = $host_name",
            )
            .bind(("id", id_str.clone()))
            .bind(("site_id", input.site_id.to_string()))
            .bind(("host_name", input.host_name))
            .await
            .map_err(DbError::from)?;

        // A duplicate host name fails here on the unique index.
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<HostRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "site_host".into(),
            id: id_str,
        })?;

        row_to_host(row, id)
    }
}

impl<C: Connection> SiteHostRepository for SurrealSiteHostRepository<C> {
    async fn find_by_host_name(&self, host_name: &str) -> SitewardResult<Option<SiteHost>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM site_host \
                 WHERE host_name = $host_name LIMIT 1",
            )
            .bind(("host_name", host_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HostRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_host()?)),
            None => Ok(None),
        }
    }

    async fn list_by_site(&self, site_id: Uuid) -> SitewardResult<Vec<SiteHost>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM site_host \
                 WHERE site_id = $site_id ORDER BY host_name ASC",
            )
            .bind(("site_id", site_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HostRowWithId> = result.take(0).map_err(DbError::from)?;
        let hosts = rows
            .into_iter()
            .map(HostRowWithId::try_into_host)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(hosts)
    }

    async fn create(&self, input: CreateSiteHost) -> SitewardResult<SiteHost> {
        retry_on_conflict("site_host", || self.insert(input.clone())).await
    }

    async fn delete(&self, site_id: Uuid, host_id: Uuid) -> SitewardResult<()> {
        self.db
            .query(
                "DELETE type::record('site_host', $id) \
                 WHERE site_id = $site_id",
            )
            .bind(("id", host_id.to_string()))
            .bind(("site_id", site_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }
}
