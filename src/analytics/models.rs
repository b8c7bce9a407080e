// Analytics models - search counters as stored in the document collection
use serde::{Deserialize, Serialize};

/// One counter document per exact search term
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchCountRecord {
    /// Store-assigned document id
    #[serde(rename = "$id")]
    pub document_id: String,
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub count: u64,
    /// Provider id of the top result when the term was first recorded
    #[serde(default)]
    pub movie_id: u64,
    #[serde(default)]
    pub poster_url: String,
}

/// Payload for creating a counter document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSearchCount {
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub count: u64,
    pub movie_id: u64,
    pub poster_url: String,
}

impl NewSearchCount {
    pub fn into_record(self, document_id: impl Into<String>) -> SearchCountRecord {
        SearchCountRecord {
            document_id: document_id.into(),
            search_term: self.search_term,
            count: self.count,
            movie_id: self.movie_id,
            poster_url: self.poster_url,
        }
    }
}

/// Partial update sent when bumping a counter
#[derive(Debug, Clone, Serialize)]
pub struct SearchCountUpdate {
    pub count: u64,
}
