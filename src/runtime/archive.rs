//! Background queue for the best-effort remote save
//!
//! Each save runs in its own task and never reports back. A failed save is
//! logged and dropped; there are no retries. Saves are tracked so the process
//! can let them finish before exiting.

use super::traits::TurnArchive;
use crate::history::{SessionIdentity, Turn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

/// Dispatches remote saves onto the current tokio runtime
#[derive(Clone)]
pub struct ArchiveQueue {
    archive: Arc<dyn TurnArchive>,
    tracker: TaskTracker,
}

impl ArchiveQueue {
    pub fn new<A: TurnArchive + 'static>(archive: A) -> Self {
        Self {
            archive: Arc::new(archive),
            tracker: TaskTracker::new(),
        }
    }

    /// Hand a turn off for saving. Never blocks and never fails the caller.
    pub fn enqueue(&self, identity: SessionIdentity, turn: Turn) {
        let archive = self.archive.clone();
        self.tracker.spawn(async move {
            match archive.save_turn(&identity, &turn).await {
                Ok(()) => {
                    tracing::debug!(email = %identity.email, "Turn archived");
                }
                Err(e) => {
                    tracing::error!(
                        email = %identity.email,
                        error = %e.message,
                        kind = %e.kind,
                        "Error saving chat"
                    );
                }
            }
        });
    }

    /// Wait up to `grace` for every dispatched save to finish. Returns
    /// `false` if some were still running when the grace period ran out.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(pending, "Waiting for remote saves");
        }

        let finished = tokio::time::timeout(grace, self.tracker.wait()).await.is_ok();
        if !finished {
            tracing::warn!(
                pending = self.tracker.len(),
                grace_ms = %grace.as_millis(),
                "Remote saves still running at exit"
            );
        }
        finished
    }
}
