//! TMDB API provider
//!
//! Talks to The Movie Database v3 REST API (default: api.themoviedb.org/3)

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::movies::provider::{MovieCatalog, MovieRecord, ProviderError};

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Listing envelope shared by `/discover/movie` and `/search/movie`
#[derive(Debug, Deserialize)]
struct TmdbListResponse {
    #[serde(default)]
    results: Vec<MovieRecord>,
    /// "False" when the provider reports a logical failure
    #[serde(default, rename = "Response")]
    response: Option<String>,
    #[serde(default, rename = "Error")]
    error: Option<String>,
}

/// TMDB provider configuration
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// TMDB movie catalog
pub struct TmdbProvider {
    config: TmdbConfig,
    client: Client,
}

impl TmdbProvider {
    pub fn new(config: TmdbConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the request URL for a committed query
    pub fn endpoint_for(&self, query: &str) -> Result<Url, ProviderError> {
        let base = self.config.base_url.trim_end_matches('/');

        let url = if query.is_empty() {
            Url::parse_with_params(
                &format!("{}/discover/movie", base),
                &[("sort_by", "popularity.desc")],
            )
        } else {
            Url::parse_with_params(&format!("{}/search/movie", base), &[("query", query)])
        };

        url.map_err(|e| ProviderError::Transport(format!("Invalid provider URL: {}", e)))
    }
}

/// Turn a provider response into movies or a typed error
pub(crate) fn parse_listing(status: u16, body: &str) -> Result<Vec<MovieRecord>, ProviderError> {
    if !(200..300).contains(&status) {
        return Err(ProviderError::Status {
            status,
            body: body.chars().take(200).collect(),
        });
    }

    let listing: TmdbListResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if listing.response.as_deref() == Some("False") {
        return Err(ProviderError::Rejected(listing.error));
    }

    Ok(listing.results)
}

#[async_trait]
impl MovieCatalog for TmdbProvider {
    fn catalog_name(&self) -> &'static str {
        "tmdb"
    }

    async fn fetch_movies(&self, query: &str) -> Result<Vec<MovieRecord>, ProviderError> {
        let url = self.endpoint_for(query)?;
        log::debug!("Fetching movies from {}", url.path());

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        let movies = parse_listing(status, &body)?;
        log::debug!("TMDB returned {} movies for {:?}", movies.len(), query);
        Ok(movies)
    }
}
