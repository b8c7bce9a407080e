// Search counter operations
// Increment-or-create and the trending read, written against any SearchCountStore

use uuid::Uuid;

use super::models::{NewSearchCount, SearchCountRecord};
use super::store::{SearchCountStore, StoreError};
use crate::movies::MovieRecord;

/// Provider image base path for poster thumbnails
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Number of records the trending panel shows
pub const TRENDING_LIMIT: usize = 5;

/// Poster url stored alongside a new counter
pub fn poster_url_for(movie: &MovieRecord) -> String {
    format!(
        "{}{}",
        POSTER_BASE_URL,
        movie.poster_path.as_deref().unwrap_or_default()
    )
}

/// Document id for a search term.
///
/// Derived from the exact term bytes so every writer picks the same id and a
/// second create for the same term fails with a conflict.
pub fn document_id_for(term: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, term.as_bytes()).to_string()
}

/// Bump the counter for `term`, creating it from `top_movie` if absent
pub async fn increment_search_count(
    store: &dyn SearchCountStore,
    term: &str,
    top_movie: &MovieRecord,
) -> Result<SearchCountRecord, StoreError> {
    if let Some(existing) = store.find_by_term(term).await? {
        return store
            .update_count(&existing.document_id, existing.count + 1)
            .await;
    }

    let data = NewSearchCount {
        search_term: term.to_string(),
        count: 1,
        movie_id: top_movie.id,
        poster_url: poster_url_for(top_movie),
    };

    match store.create(&document_id_for(term), &data).await {
        Ok(record) => Ok(record),
        Err(StoreError::Conflict(id)) => {
            // Another writer created it between our lookup and create
            log::debug!("Counter {} created concurrently, incrementing instead", id);
            match store.find_by_term(term).await? {
                Some(existing) => {
                    store
                        .update_count(&existing.document_id, existing.count + 1)
                        .await
                }
                None => Err(StoreError::Conflict(id)),
            }
        }
        Err(e) => Err(e),
    }
}

/// Most-searched terms, highest count first
pub async fn trending_searches(
    store: &dyn SearchCountStore,
) -> Result<Vec<SearchCountRecord>, StoreError> {
    let mut records = store.top_by_count(TRENDING_LIMIT).await?;
    // Stable: ties keep whatever order the store returned
    records.sort_by(|a, b| b.count.cmp(&a.count));
    records.truncate(TRENDING_LIMIT);
    Ok(records)
}
