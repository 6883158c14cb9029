//! Log Monitor Task
//!
//! Background task that waits for the transaction log writer to fail and
//! escalates the failure.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::wal::LogFailure;

/// Spawns a task that waits on the writer's failure channel.
///
/// When a failure arrives it is logged as the service entering read-only
/// degraded mode, and the task ends. If the writer goes away cleanly the
/// task ends quietly.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let monitor = spawn_log_monitor(service.log_errors());
/// // Later, during shutdown:
/// monitor.abort();
/// ```
pub fn spawn_log_monitor(mut errors: watch::Receiver<LogFailure>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Watching transaction log writer for failures");

        match errors.wait_for(Option::is_some).await {
            Ok(failure) => {
                if let Some(err) = failure.as_ref() {
                    error!(
                        error = %err,
                        "Transaction log writer failed, rejecting all further mutations"
                    );
                }
            }
            Err(_) => debug!("Transaction log writer dropped without failure"),
        }
    })
}
