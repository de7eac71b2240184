//! Retention Cleanup Task
//!
//! Background task that periodically sweeps entries older than the retention
//! period from every store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::undo::UndoBuffer;

/// Spawns a background task that periodically runs [`UndoBuffer::cleanup`].
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep computes one cutoff shared by all stores.
///
/// # Arguments
/// * `undo` - Shared reference to the undo buffer
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let undo = Arc::new(UndoBuffer::from_config(&config).await?);
/// let cleanup_handle = spawn_cleanup_task(undo.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(undo: Arc<UndoBuffer>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting retention cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let report = undo.cleanup().await;

            for (store, part) in [
                ("messages", &report.messages),
                ("files", &report.files),
                ("images", &report.images),
            ] {
                for failure in &part.failed {
                    warn!(
                        "Retention cleanup: could not remove {} entry {}: {}",
                        store, failure.id, failure.reason
                    );
                }
            }

            // Log cleanup statistics
            let removed = report.total_removed();
            if removed > 0 {
                info!(
                    "Retention cleanup: removed {} entries (messages={}, files={}, images={})",
                    removed,
                    report.messages.removed_count(),
                    report.files.removed_count(),
                    report.images.removed_count()
                );
            } else {
                debug!("Retention cleanup: no expired entries found");
            }
        }
    })
}
