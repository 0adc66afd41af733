//! SurrealDB implementation of [`LogRepository`].

use chrono::{DateTime, Utc};
use siteward_core::error::SitewardResult;
use siteward_core::models::log_entry::{CreateLogEntry, LogEntry};
use siteward_core::repository::{LogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct LogRow {
    record_id: String,
    logged_at: DateTime<Utc>,
    ip_address: String,
    culture: String,
    url: String,
    short_url: String,
    thread: String,
    log_level: String,
    logger: String,
    message: String,
}

impl LogRow {
    fn try_into_entry(self) -> Result<LogEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid log UUID: {e}")))?;
        Ok(LogEntry {
            id,
            logged_at: self.logged_at,
            ip_address: self.ip_address,
            culture: self.culture,
            url: self.url,
            short_url: self.short_url,
            thread: self.thread,
            log_level: self.log_level,
            logger: self.logger,
            message: self.message,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the application log repository.
#[derive(Clone)]
pub struct SurrealLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> LogRepository for SurrealLogRepository<C> {
    async fn create(&self, input: CreateLogEntry) -> SitewardResult<LogEntry> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('log_entry', $id) SET \
                 logged_at = $logged_at, ip_address = $ip_address, \
                 culture = $culture, url = $url, short_url = $short_url, \
                 thread = $thread, log_level = $log_level, \
                 logger = $logger, message = $message; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('log_entry', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("logged_at", input.logged_at))
            .bind(("ip_address", input.ip_address))
            .bind(("culture", input.culture))
            .bind(("url", input.url))
            .bind(("short_url", input.short_url))
            .bind(("thread", input.thread))
            .bind(("log_level", input.log_level))
            .bind(("logger", input.logger))
            .bind(("message", input.message))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<LogRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "log_entry".into(),
            id: id_str,
        })?;

        Ok(row.try_into_entry()?)
    }

    async fn list(&self, pagination: Pagination) -> SitewardResult<PaginatedResult<LogEntry>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM log_entry GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM log_entry \
                 ORDER BY logged_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LogRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(LogRow::try_into_entry)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn delete(&self, id: Uuid) -> SitewardResult<()> {
        self.db
            .query("DELETE type::record('log_entry', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> SitewardResult<()> {
        self.db
            .query("DELETE log_entry WHERE logged_at < $cutoff")
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_all(&self) -> SitewardResult<()> {
        self.db
            .query("DELETE log_entry")
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }
}
