//! In-process search counter store
//!
//! Keeps documents in a `DashMap`. Every operation yields once before touching
//! the map so concurrent callers interleave the way they would against a
//! remote store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::models::{NewSearchCount, SearchCountRecord};
use super::store::{SearchCountStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<String, SearchCountRecord>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    async fn round_trip(&self) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("store unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchCountStore for MemoryStore {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_term(&self, term: &str) -> Result<Option<SearchCountRecord>, StoreError> {
        self.round_trip().await?;
        Ok(self
            .documents
            .iter()
            .find(|entry| entry.search_term == term)
            .map(|entry| entry.value().clone()))
    }

    async fn create(
        &self,
        document_id: &str,
        data: &NewSearchCount,
    ) -> Result<SearchCountRecord, StoreError> {
        self.round_trip().await?;

        use dashmap::mapref::entry::Entry;
        match self.documents.entry(document_id.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(document_id.to_string())),
            Entry::Vacant(slot) => {
                let record = data.clone().into_record(document_id);
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn update_count(
        &self,
        document_id: &str,
        count: u64,
    ) -> Result<SearchCountRecord, StoreError> {
        self.round_trip().await?;

        let mut record = self
            .documents
            .get_mut(document_id)
            .ok_or_else(|| StoreError::Status {
                status: 404,
                message: format!("Document {} not found", document_id),
            })?;
        record.count = count;
        Ok(record.clone())
    }

    async fn top_by_count(&self, limit: usize) -> Result<Vec<SearchCountRecord>, StoreError> {
        self.round_trip().await?;

        let mut records: Vec<SearchCountRecord> = self
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.count.cmp(&a.count));
        records.truncate(limit);
        Ok(records)
    }
}
