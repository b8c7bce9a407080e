// Search analytics
// Counts successful searches per exact term and serves the trending list

pub mod models;
pub mod store;
pub mod search_counts;
pub mod recorder;
pub mod appwrite_store;
pub mod memory_store;

pub use models::{NewSearchCount, SearchCountRecord};
pub use store::{SearchCountStore, StoreError};
pub use search_counts::{increment_search_count, trending_searches, TRENDING_LIMIT};
pub use recorder::{RecorderWorker, SearchRecorder};
pub use appwrite_store::{AppwriteConfig, AppwriteStore};
pub use memory_store::MemoryStore;
