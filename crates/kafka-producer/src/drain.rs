//! Outstanding-message accounting behind the drain barrier.

use std::time::Duration;
use tokio::sync::watch;

/// Counts messages that were enqueued but have not reached a terminal
/// outcome yet.
///
/// Incremented before a message enters the queue and decremented after its
/// callback has returned, so a count of zero means every callback has run.
#[derive(Debug)]
pub(crate) struct OutstandingTracker {
    count: watch::Sender<usize>,
}

impl OutstandingTracker {
    pub(crate) fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    pub(crate) fn enqueued(&self) {
        self.count.send_modify(|n| *n += 1);
    }

    pub(crate) fn resolved(&self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }

    pub(crate) fn outstanding(&self) -> usize {
        *self.count.borrow()
    }

    /// Wait until nothing is outstanding or `timeout` passes, returning the
    /// number of messages still outstanding.
    pub(crate) async fn wait_drained(&self, timeout: Duration) -> usize {
        let mut rx = self.count.subscribe();
        if tokio::time::timeout(timeout, rx.wait_for(|n| *n == 0))
            .await
            .is_err()
        {
            tracing::debug!("Drain timed out after {:?}", timeout);
        }
        self.outstanding()
    }
}
