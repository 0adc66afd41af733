//! SurrealDB repository implementations.

mod host;
mod log;
mod site;

pub use host::SurrealSiteHostRepository;
pub use log::SurrealLogRepository;
pub use site::SurrealSiteRepository;

use siteward_core::error::SitewardResult;
use tracing::debug;

use crate::error::DbError;

/// Attempts made for a write that keeps losing to concurrent transactions.
const WRITE_CONFLICT_ATTEMPTS: u32 = 5;

/// Run `write`, re-running it while the store reports a write conflict.
///
/// A re-run sees the winning transaction's data, so a racing insert on a
/// unique field ends as [`DbError::UniqueViolation`].
async fn retry_on_conflict<T, F, Fut>(what: &'static str, mut write: F) -> SitewardResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Err(DbError::WriteConflict(err)) if attempt < WRITE_CONFLICT_ATTEMPTS => {
                debug!(what, attempt, error = %err, "Write conflict, retrying");
                attempt += 1;
            }
            result => return result.map_err(Into::into),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict() -> DbError {
        DbError::WriteConflict(surrealdb::Error::query(
            "Cannot COMMIT".to_string(),
            Some(surrealdb_types::QueryError::TransactionConflict),
        ))
    }

    #[tokio::test]
    async fn conflicts_are_retried_until_the_write_lands() {
        let mut calls = 0;
        let result = retry_on_conflict("test", || {
            calls += 1;
            let outcome = if calls < 3 { Err(conflict()) } else { Ok(calls) };
            async move { outcome }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn retries_stop_after_the_attempt_limit() {
        let mut calls = 0;
        let result: SitewardResult<()> = retry_on_conflict("test", || {
            calls += 1;
            async { Err(conflict()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, WRITE_CONFLICT_ATTEMPTS);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let mut calls = 0;
        let result: SitewardResult<()> = retry_on_conflict("test", || {
            calls += 1;
            async {
                Err(DbError::UniqueViolation {
                    index: "idx_site_alias".into(),
                })
            }
        })
        .await;
        assert!(result.unwrap_err().is_conflict_on("alias_id"));
        assert_eq!(calls, 1);
    }
}
