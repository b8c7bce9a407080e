//! Movie catalog trait and types
//!
//! Defines the common interface for movie metadata backends and the record
//! shape every backend normalizes into.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when the provider rejects a request without saying why
pub const DEFAULT_REJECTION_MESSAGE: &str = "Failed to fetch movies";

/// Message shown for every transport-level failure
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch movies. Please try again later.";

/// Error types for movie catalog operations
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a structured error payload (`Response: "False"`)
    #[error("Provider rejected request: {}", .0.as_deref().unwrap_or(DEFAULT_REJECTION_MESSAGE))]
    Rejected(Option<String>),
    /// Non-2xx status code
    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Connection, DNS, TLS or timeout failure
    #[error("Request failed: {0}")]
    Transport(String),
    /// Body was not the JSON shape we expect
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Human-readable message for the movie panel.
    ///
    /// Logical rejections carry the provider's own wording; everything else
    /// collapses to one generic message.
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::Rejected(Some(msg)) if !msg.is_empty() => msg.clone(),
            ProviderError::Rejected(_) => DEFAULT_REJECTION_MESSAGE.to_string(),
            ProviderError::Status { .. }
            | ProviderError::Transport(_)
            | ProviderError::Decode(_) => FETCH_FAILED_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// A movie as returned by the provider.
///
/// Only the fields the application reads are typed; everything else the
/// provider sends is kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub original_language: Option<String>,
    /// Raw provider fields not modelled above
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MovieRecord {
    /// Release year, if the provider sent a date
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .filter(|y| !y.is_empty())
    }
}

/// The interface every movie metadata backend implements
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Get the catalog name (e.g., "tmdb")
    fn catalog_name(&self) -> &'static str;

    /// Fetch movies for a committed query.
    ///
    /// An empty query returns the provider's popular listing; anything else is
    /// a text search. Results keep the provider's order.
    async fn fetch_movies(&self, query: &str) -> Result<Vec<MovieRecord>, ProviderError>;
}
