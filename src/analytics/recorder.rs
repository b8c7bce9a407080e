//! Search recorder - single writer for counter increments
//!
//! Callers hand off (term, top movie) pairs and return immediately. One worker
//! task applies them in order, so two increments from this process never
//! interleave their lookup and write.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::search_counts::increment_search_count;
use super::store::SearchCountStore;
use crate::movies::MovieRecord;

/// A pending increment
struct RecordJob {
    term: String,
    top_movie: MovieRecord,
}

/// Cloneable handle for queueing increments
#[derive(Clone)]
pub struct SearchRecorder {
    tx: mpsc::UnboundedSender<RecordJob>,
}

/// The task applying queued increments
pub struct RecorderWorker {
    handle: JoinHandle<()>,
}

impl SearchRecorder {
    /// Start the worker on the current runtime
    pub fn spawn(store: Arc<dyn SearchCountStore>) -> (Self, RecorderWorker) {
        let (tx, mut rx) = mpsc::unbounded_channel::<RecordJob>();

        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match increment_search_count(store.as_ref(), &job.term, &job.top_movie).await {
                    Ok(record) => log::debug!(
                        "Search count for {:?} is now {}",
                        record.search_term,
                        record.count
                    ),
                    Err(e) => log::error!("Error updating search count for {:?}: {}", job.term, e),
                }
            }
            log::debug!("Search recorder stopped");
        });

        (Self { tx }, RecorderWorker { handle: worker })
    }

    /// Queue an increment. Never blocks and never fails from the caller's side.
    pub fn record(&self, term: impl Into<String>, top_movie: MovieRecord) {
        let job = RecordJob {
            term: term.into(),
            top_movie,
        };
        if self.tx.send(job).is_err() {
            log::warn!("Search recorder is not running; dropping increment");
        }
    }
}

impl RecorderWorker {
    /// Wait for the queue to drain.
    ///
    /// Returns once every [`SearchRecorder`] handle has been dropped and the
    /// remaining increments have been applied.
    pub async fn finish(self) {
        if let Err(e) = self.handle.await {
            log::error!("Search recorder task failed: {}", e);
        }
    }
}
