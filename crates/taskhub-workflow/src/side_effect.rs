//! Best-effort side effects.
//!
//! Work spawned here runs after the primary write has committed. It is
//! bounded by a timeout, and its failures never reach the caller: they
//! are logged and counted so operators can still see them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use taskhub_core::error::TaskhubResult;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// Runner for fire-and-forget work with a shared timeout and failure sink.
#[derive(Clone)]
pub struct SideEffects {
    tracker: TaskTracker,
    timeout: Duration,
    failures: Arc<AtomicU64>,
}

impl SideEffects {
    pub fn new(timeout: Duration) -> Self {
        Self {
            tracker: TaskTracker::new(),
            timeout,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawn `fut` in the background. `name` identifies the effect in
    /// logs.
    pub fn spawn<F>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = TaskhubResult<()>> + Send + 'static,
    {
        let timeout = self.timeout;
        let failures = Arc::clone(&self.failures);

        self.tracker.spawn(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(Ok(())) => debug!(effect = name, "side effect completed"),
                Ok(Err(e)) => {
                    failures.fetch_add(1, Ordering::Relaxed);
                    warn!(effect = name, error = %e, "side effect failed");
                }
                Err(_) => {
                    failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        effect = name,
                        timeout_ms = timeout.as_millis() as u64,
                        "side effect timed out"
                    );
                }
            }
        });
    }

    /// Wait until every effect spawned so far has finished.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Number of effects that failed or timed out since construction.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Effects currently in flight.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }
}
