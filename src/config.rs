// Configuration for Movie Finder
// Read once from the environment at startup

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::analytics::AppwriteConfig;
use crate::movies::providers::tmdb_provider::DEFAULT_TMDB_BASE_URL;
use crate::movies::TmdbConfig;
use crate::session::SessionConfig;

/// Everything needed to start a session
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tmdb: TmdbConfig,
    pub appwrite: AppwriteConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("Missing required environment variable {}", key))
        };

        let timeout_secs: u64 = parse_or(&lookup, "HTTP_TIMEOUT_SECS", 30)?;
        let debounce_ms: u64 = parse_or(&lookup, "SEARCH_DEBOUNCE_MS", 1000)?;

        let tmdb = TmdbConfig {
            base_url: lookup("TMDB_API_BASE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string()),
            api_key: required("TMDB_API_KEY")?,
            timeout_secs,
        };

        let appwrite = AppwriteConfig {
            endpoint: required("APPWRITE_ENDPOINT")?,
            project_id: required("APPWRITE_PROJECT_ID")?,
            database_id: required("APPWRITE_DATABASE_ID")?,
            collection_id: required("APPWRITE_COLLECTION_ID")?,
            api_key: lookup("APPWRITE_API_KEY").filter(|v| !v.is_empty()),
            timeout_secs,
        };

        Ok(Self {
            tmdb,
            appwrite,
            session: SessionConfig {
                debounce: Duration::from_millis(debounce_ms),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}
