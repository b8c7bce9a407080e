// Movie Finder - movie search with trending search analytics
//
// - Debounced search input
// - TMDB movie lookup (popular listing or text search)
// - Appwrite-backed search counters and the trending list

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

pub mod analytics;
pub mod config;
pub mod debounce;
pub mod movies;
pub mod session;
pub mod state;
pub mod terminal;

#[cfg(test)]
mod http_fixture;

pub use config::AppConfig;
pub use session::{SearchSession, SessionConfig};
pub use state::{DiscoveryState, LoadState};

use analytics::AppwriteStore;
use movies::TmdbProvider;

/// How long runtime teardown waits for blocking tasks
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

// ============== Main App Entry ==============

pub fn run() -> Result<()> {
    // Initialize env_logger to output to stderr (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    run_to_completion(runtime, async move {
        let catalog = TmdbProvider::new(config.tmdb).context("Failed to set up movie provider")?;
        let store = AppwriteStore::new(config.appwrite).context("Failed to set up search analytics store")?;

        let session = SearchSession::start(Arc::new(catalog), Arc::new(store), config.session);
        terminal::run_terminal(session).await
    })
}

/// Drive `future` to completion, then stop the runtime.
///
/// Blocking tasks still running after [`SHUTDOWN_GRACE`] are left behind
/// instead of holding the process open.
fn run_to_completion<F: Future>(runtime: tokio::runtime::Runtime, future: F) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    output
}
