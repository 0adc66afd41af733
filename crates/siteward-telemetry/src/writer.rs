//! Background task that persists log entries.

use siteward_core::models::log_entry::CreateLogEntry;
use siteward_core::repository::LogRepository;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Drain `rx` into `repo` until every sender is dropped.
///
/// Write failures go to stderr. Reporting them through `tracing` would
/// feed them straight back into the same channel.
pub fn spawn_log_writer<R>(repo: R, mut rx: UnboundedReceiver<CreateLogEntry>) -> JoinHandle<()>
where
    R: LogRepository + 'static,
{
    tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            if let Err(e) = repo.create(entry).await {
                eprintln!("siteward: failed to persist log entry: {e}");
            }
        }
    })
}
