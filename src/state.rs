// State published by a search session

use serde::{Deserialize, Serialize};

use crate::analytics::SearchCountRecord;
use crate::movies::MovieRecord;

/// Lifecycle of one asynchronous panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Failure(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failure(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Everything the front end renders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DiscoveryState {
    /// Raw search box value, before debouncing
    pub search_term: String,
    /// Query the movie panel reflects
    pub committed_query: String,
    pub movies: LoadState<Vec<MovieRecord>>,
    pub trending: LoadState<Vec<SearchCountRecord>>,
}
