//! Search input debouncing
//!
//! Collapses bursts of raw input into one committed value. Each push cancels
//! the pending timer and arms a new one; a value is committed only if its
//! timer runs out uncancelled. Trailing edge only, no max-wait.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Quiet period before a search box value is committed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

type PendingTimer = Arc<Mutex<Option<CancellationToken>>>;

/// Trailing-edge debouncer delivering commits on a channel
pub struct Debouncer<T> {
    delay: Duration,
    tx: mpsc::UnboundedSender<T>,
    pending: PendingTimer,
    shutdown: CancellationToken,
}

fn lock(pending: &PendingTimer) -> MutexGuard<'_, Option<CancellationToken>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer and the receiver its commits arrive on
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        Self::with_parent(delay, &CancellationToken::new())
    }

    /// Like [`Debouncer::new`], but torn down when `parent` is cancelled
    pub fn with_parent(
        delay: Duration,
        parent: &CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            tx,
            pending: Arc::new(Mutex::new(None)),
            shutdown: parent.child_token(),
        };
        (debouncer, rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Feed a new raw value, superseding any value still waiting
    pub fn push(&self, value: T) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let timer = self.shutdown.child_token();
        if let Some(previous) = lock(&self.pending).replace(timer.clone()) {
            previous.cancel();
        }

        let pending = self.pending.clone();
        let tx = self.tx.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // Checked under the lock so a concurrent push either
                    // cancels us first or arms after we commit.
                    let mut slot = lock(&pending);
                    if timer.is_cancelled() {
                        return;
                    }
                    *slot = None;
                    let _ = tx.send(value);
                }
            }
        });
    }

    /// Drop the waiting value, if any, without committing it
    pub fn cancel_pending(&self) {
        if let Some(previous) = lock(&self.pending).take() {
            previous.cancel();
        }
    }

    /// True while a value is waiting for its quiet period
    pub fn has_pending(&self) -> bool {
        lock(&self.pending).is_some()
    }

    /// Tear down: nothing pending commits and later pushes are ignored
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.cancel_pending();
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
