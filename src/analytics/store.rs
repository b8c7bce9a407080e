//! Search counter store trait
//!
//! Defines the document operations the analytics layer needs from a backend.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{NewSearchCount, SearchCountRecord};

/// Error types for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A document with the requested id already exists
    #[error("Document already exists: {0}")]
    Conflict(String),
    /// Store answered with a non-2xx status (auth, validation, missing collection)
    #[error("Store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// Connection, DNS, TLS or timeout failure
    #[error("Store request failed: {0}")]
    Transport(String),
    /// Body was not the JSON shape we expect
    #[error("Invalid store response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

/// Document operations scoped to one counter collection
#[async_trait]
pub trait SearchCountStore: Send + Sync {
    /// Get the store name (e.g., "appwrite", "memory")
    fn store_name(&self) -> &'static str;

    /// Find the record whose search term equals `term` exactly
    async fn find_by_term(&self, term: &str) -> Result<Option<SearchCountRecord>, StoreError>;

    /// Create a record under a caller-chosen document id.
    ///
    /// Returns [`StoreError::Conflict`] if the id is taken.
    async fn create(
        &self,
        document_id: &str,
        data: &NewSearchCount,
    ) -> Result<SearchCountRecord, StoreError>;

    /// Overwrite the count of an existing record, leaving other fields alone
    async fn update_count(
        &self,
        document_id: &str,
        count: u64,
    ) -> Result<SearchCountRecord, StoreError>;

    /// Records ordered by descending count, at most `limit` of them
    async fn top_by_count(&self, limit: usize) -> Result<Vec<SearchCountRecord>, StoreError>;
}
