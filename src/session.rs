//! Search session - wires the search box to the movie and trending panels
//!
//! Raw input goes through the debouncer; each committed query is fetched from
//! the movie catalog and published as [`DiscoveryState`]. Successful non-empty
//! searches feed the analytics recorder. The trending panel is loaded once at
//! start and on request.
//!
//! Every task the session launches is tracked and watches the session's
//! cancellation token, so nothing is published after [`SearchSession::shutdown`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::analytics::{trending_searches, RecorderWorker, SearchCountStore, SearchRecorder};
use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE};
use crate::movies::{MovieCatalog, MovieRecord};
use crate::state::{DiscoveryState, LoadState};

/// Message shown when the trending panel cannot be loaded
pub const TRENDING_FAILED_MESSAGE: &str = "Failed to fetch trending movies. Please try again later.";

/// Session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Shared by the session and every task it spawns
#[derive(Clone)]
struct Pipeline {
    catalog: Arc<dyn MovieCatalog>,
    store: Arc<dyn SearchCountStore>,
    recorder: SearchRecorder,
    state: Arc<watch::Sender<DiscoveryState>>,
    /// Sequence number of the newest movie query issued
    latest_query: Arc<AtomicU64>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Pipeline {
    /// Start fetching a committed query.
    ///
    /// Re-committing the query the movie panel already reflects is a no-op.
    fn commit(&self, query: String) {
        let mut issued = None;
        self.state.send_if_modified(|state| {
            if self.cancel.is_cancelled() {
                return false;
            }
            if state.committed_query == query && state.movies != LoadState::Idle {
                return false;
            }
            let seq = self.latest_query.fetch_add(1, Ordering::SeqCst) + 1;
            state.committed_query = query.clone();
            state.movies = LoadState::Loading;
            issued = Some(seq);
            true
        });

        let Some(seq) = issued else {
            log::debug!("Query {:?} unchanged, not refetching", query);
            return;
        };

        let pipeline = self.clone();
        self.tracker.spawn(async move {
            let result = tokio::select! {
                _ = pipeline.cancel.cancelled() => return,
                result = pipeline.catalog.fetch_movies(&query) => result,
            };

            let movies = match result {
                Ok(movies) => {
                    if !query.is_empty() {
                        if let Some(top) = movies.first() {
                            pipeline.recorder.record(query.clone(), top.clone());
                        }
                    }
                    LoadState::Success(movies)
                }
                Err(e) => {
                    log::error!("Error fetching movies for {:?}: {}", query, e);
                    LoadState::Failure(e.user_message())
                }
            };

            pipeline.publish_movies(seq, movies);
        });
    }

    /// Publish a movie result unless a newer query was issued meanwhile
    fn publish_movies(&self, seq: u64, movies: LoadState<Vec<MovieRecord>>) {
        self.state.send_if_modified(|state| {
            if self.cancel.is_cancelled() {
                return false;
            }
            if self.latest_query.load(Ordering::SeqCst) != seq {
                log::debug!("Discarding stale movie response #{}", seq);
                return false;
            }
            state.movies = movies;
            true
        });
    }

    fn load_trending(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.state.send_modify(|state| state.trending = LoadState::Loading);

        let pipeline = self.clone();
        self.tracker.spawn(async move {
            let result = tokio::select! {
                _ = pipeline.cancel.cancelled() => return,
                result = trending_searches(pipeline.store.as_ref()) => result,
            };

            let trending = match result {
                Ok(records) => LoadState::Success(records),
                Err(e) => {
                    log::error!("Error fetching trending movies: {}", e);
                    LoadState::Failure(TRENDING_FAILED_MESSAGE.to_string())
                }
            };

            pipeline.state.send_if_modified(|state| {
                if pipeline.cancel.is_cancelled() {
                    return false;
                }
                state.trending = trending;
                true
            });
        });
    }
}

/// A running search session
pub struct SearchSession {
    pipeline: Pipeline,
    debouncer: Debouncer<String>,
    recorder_worker: RecorderWorker,
}

impl SearchSession {
    /// Start a session: loads trending and the popular listing right away
    pub fn start(
        catalog: Arc<dyn MovieCatalog>,
        store: Arc<dyn SearchCountStore>,
        config: SessionConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let (recorder, recorder_worker) = SearchRecorder::spawn(store.clone());
        let (state, _) = watch::channel(DiscoveryState::default());
        let (debouncer, commits) = Debouncer::with_parent(config.debounce, &cancel);

        let pipeline = Pipeline {
            catalog,
            store,
            recorder,
            state: Arc::new(state),
            latest_query: Arc::new(AtomicU64::new(0)),
            cancel,
            tracker,
        };

        log::info!(
            "Search session started (catalog: {}, store: {}, debounce: {:?})",
            pipeline.catalog.catalog_name(),
            pipeline.store.store_name(),
            debouncer.delay()
        );

        pipeline.load_trending();
        pipeline.commit(String::new());
        Self::spawn_commit_pump(&pipeline, commits);

        Self {
            pipeline,
            debouncer,
            recorder_worker,
        }
    }

    fn spawn_commit_pump(pipeline: &Pipeline, mut commits: mpsc::UnboundedReceiver<String>) {
        let pipeline = pipeline.clone();
        pipeline.tracker.clone().spawn(async move {
            loop {
                let query = tokio::select! {
                    _ = pipeline.cancel.cancelled() => break,
                    query = commits.recv() => query,
                };
                match query {
                    Some(query) => pipeline.commit(query),
                    None => break,
                }
            }
        });
    }

    /// Receiver for state changes
    pub fn subscribe(&self) -> watch::Receiver<DiscoveryState> {
        self.pipeline.state.subscribe()
    }

    /// Current state
    pub fn snapshot(&self) -> DiscoveryState {
        self.pipeline.state.borrow().clone()
    }

    /// New raw value of the search box
    pub fn set_search_term(&self, raw: impl Into<String>) {
        if self.pipeline.cancel.is_cancelled() {
            return;
        }
        let raw = raw.into();
        self.pipeline.state.send_modify(|state| state.search_term = raw.clone());
        self.debouncer.push(raw);
    }

    /// Reload the trending panel
    pub fn refresh_trending(&self) {
        self.pipeline.load_trending();
    }

    /// Tear down: pending input never commits, in-flight fetches are
    /// abandoned, and queued search counts are flushed before returning.
    pub async fn shutdown(self) {
        let Self {
            pipeline,
            debouncer,
            recorder_worker,
        } = self;

        debouncer.shutdown();
        pipeline.cancel.cancel();
        pipeline.tracker.close();
        pipeline.tracker.wait().await;

        drop(debouncer);
        drop(pipeline);
        recorder_worker.finish().await;
        log::info!("Search session stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MemoryStore;
    use crate::movies::provider::{ProviderError, FETCH_FAILED_MESSAGE};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_millis(1000);

    fn movie(id: u64) -> MovieRecord {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Movie {}", id),
            "poster_path": format!("/{}.jpg", id),
            "popularity": 10.0
        }))
        .unwrap()
    }

    enum Canned {
        Movies(Vec<u64>),
        Rejected(&'static str),
        ServerError,
    }

    /// Catalog answering from a table after a per-query latency
    struct FakeCatalog {
        responses: HashMap<String, (Duration, Canned)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, query: &str, latency_ms: u64, canned: Canned) -> Self {
            self.responses
                .insert(query.to_string(), (Duration::from_millis(latency_ms), canned));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MovieCatalog for FakeCatalog {
        fn catalog_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_movies(&self, query: &str) -> Result<Vec<MovieRecord>, ProviderError> {
            self.calls.lock().unwrap().push(query.to_string());
            let Some((latency, canned)) = self.responses.get(query) else {
                return Ok(Vec::new());
            };
            sleep(*latency).await;
            match canned {
                Canned::Movies(ids) => Ok(ids.iter().map(|id| movie(*id)).collect()),
                Canned::Rejected(msg) => Err(ProviderError::Rejected(Some(msg.to_string()))),
                Canned::ServerError => Err(ProviderError::Status {
                    status: 500,
                    body: String::new(),
                }),
            }
        }
    }

    fn start(catalog: FakeCatalog) -> (SearchSession, Arc<FakeCatalog>, Arc<MemoryStore>) {
        let catalog = Arc::new(catalog);
        let store = Arc::new(MemoryStore::new());
        let session = SearchSession::start(
            catalog.clone(),
            store.clone(),
            SessionConfig { debounce: DELAY },
        );
        (session, catalog, store)
    }

    async fn settled(session: &SearchSession) -> DiscoveryState {
        let mut rx = session.subscribe();
        let state = rx
            .wait_for(|s| !s.movies.is_loading() && !s.trending.is_loading())
            .await
            .unwrap()
            .clone();
        state
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_loads_popular_and_trending() {
        let (session, catalog, _store) = start(FakeCatalog::new().with("", 100, Canned::Movies(vec![1, 2, 3])));

        let state = settled(&session).await;
        assert_eq!(state.committed_query, "");
        assert_eq!(state.movies.data().map(|m| m.len()), Some(3));
        assert_eq!(state.trending, LoadState::Success(Vec::new()));
        assert_eq!(catalog.calls(), vec![""]);

        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_fires_one_query_and_one_increment() {
        let (session, catalog, store) = start(
            FakeCatalog::new()
                .with("", 10, Canned::Movies(vec![1]))
                .with("dune", 10, Canned::Movies(vec![438631, 841])),
        );
        settled(&session).await;

        for raw in ["d", "du", "dun", "dune"] {
            session.set_search_term(raw);
            sleep(Duration::from_millis(150)).await;
        }
        assert_eq!(session.snapshot().search_term, "dune");

        sleep(Duration::from_secs(3)).await;
        let state = settled(&session).await;
        assert_eq!(state.committed_query, "dune");
        assert_eq!(catalog.calls(), vec!["", "dune"]);

        session.shutdown().await;

        let record = store.find_by_term("dune").await.unwrap().unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.movie_id, 438631);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_and_fruitless_queries_are_not_counted() {
        let (session, catalog, store) = start(
            FakeCatalog::new()
                .with("", 10, Canned::Movies(vec![1, 2]))
                .with("zzzz", 10, Canned::Movies(vec![])),
        );

        session.set_search_term("zzzz");
        sleep(Duration::from_secs(2)).await;
        let state = settled(&session).await;
        assert_eq!(state.movies, LoadState::Success(Vec::new()));

        session.set_search_term("");
        sleep(Duration::from_secs(2)).await;
        settled(&session).await;

        assert_eq!(catalog.calls(), vec!["", "zzzz", ""]);
        session.shutdown().await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_commit_is_not_refetched() {
        let (session, catalog, _store) = start(FakeCatalog::new().with("", 10, Canned::Movies(vec![1])));
        settled(&session).await;

        session.set_search_term("a");
        sleep(Duration::from_millis(200)).await;
        session.set_search_term("");
        sleep(Duration::from_secs(3)).await;

        assert_eq!(catalog.calls(), vec![""]);
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let (session, _catalog, store) = start(
            FakeCatalog::new()
                .with("slow", 5000, Canned::Movies(vec![10]))
                .with("fast", 500, Canned::Movies(vec![20])),
        );

        session.set_search_term("slow");
        sleep(Duration::from_millis(1500)).await;
        session.set_search_term("fast");
        sleep(Duration::from_secs(10)).await;

        let state = session.snapshot();
        assert_eq!(state.committed_query, "fast");
        let ids: Vec<u64> = state.movies.data().unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![20]);

        session.shutdown().await;
        // Both searches happened, so both are counted
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_rejection_clears_results() {
        let (session, _catalog, store) = start(
            FakeCatalog::new()
                .with("", 10, Canned::Movies(vec![1, 2]))
                .with("nothing", 10, Canned::Rejected("Movie not found!")),
        );
        settled(&session).await;

        session.set_search_term("nothing");
        sleep(Duration::from_secs(2)).await;
        let state = settled(&session).await;
        assert_eq!(state.movies, LoadState::Failure("Movie not found!".to_string()));
        assert!(state.movies.data().is_none());

        session.shutdown().await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_shows_generic_message() {
        let (session, _catalog, _store) = start(FakeCatalog::new().with("", 10, Canned::ServerError));

        let state = settled(&session).await;
        assert_eq!(state.movies.error(), Some(FETCH_FAILED_MESSAGE));
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trending_failure_is_reported() {
        let catalog = Arc::new(FakeCatalog::new());
        let store = Arc::new(MemoryStore::new());
        store.set_failing(true);
        let session = SearchSession::start(catalog, store.clone(), SessionConfig { debounce: DELAY });

        let state = settled(&session).await;
        assert_eq!(state.trending.error(), Some(TRENDING_FAILED_MESSAGE));

        store.set_failing(false);
        session.refresh_trending();
        let state = settled(&session).await;
        assert_eq!(state.trending, LoadState::Success(Vec::new()));
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trending_reflects_recorded_searches() {
        let (session, _catalog, _store) = start(
            FakeCatalog::new()
                .with("heat", 10, Canned::Movies(vec![949]))
                .with("ronin", 10, Canned::Movies(vec![8195])),
        );

        for term in ["heat", "ronin", "heat"] {
            session.set_search_term(term);
            sleep(Duration::from_secs(2)).await;
        }
        session.refresh_trending();
        let state = settled(&session).await;

        let trending = state.trending.data().unwrap();
        assert_eq!(trending[0].search_term, "heat");
        assert_eq!(trending[0].count, 2);
        assert_eq!(trending[1].search_term, "ronin");
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_pending_input() {
        let (session, catalog, store) = start(
            FakeCatalog::new()
                .with("", 10, Canned::Movies(vec![1]))
                .with("jaws", 10, Canned::Movies(vec![578])),
        );
        settled(&session).await;
        let mut rx = session.subscribe();

        session.set_search_term("jaws");
        rx.borrow_and_update();
        session.shutdown().await;
        sleep(Duration::from_secs(5)).await;

        assert_eq!(catalog.calls(), vec![""]);
        assert!(store.is_empty());
        // Sender is gone and nothing was published after the keystroke
        assert!(rx.has_changed().is_err());
        assert_eq!(rx.borrow().committed_query, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_in_flight_fetch() {
        let (session, _catalog, store) = start(
            FakeCatalog::new()
                .with("", 10, Canned::Movies(vec![1]))
                .with("slow", 60_000, Canned::Movies(vec![2])),
        );
        settled(&session).await;
        let rx = session.subscribe();

        session.set_search_term("slow");
        sleep(Duration::from_secs(2)).await;
        assert!(rx.borrow().movies.is_loading());

        session.shutdown().await;
        assert!(rx.borrow().movies.is_loading());
        assert!(store.is_empty());
    }
}
