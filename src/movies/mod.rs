//! Movie metadata lookup
//!
//! Backends implement [`MovieCatalog`]; TMDB is the only one shipped.

pub mod provider;
pub mod providers;

pub use provider::{MovieCatalog, MovieRecord, ProviderError};
pub use providers::{TmdbConfig, TmdbProvider};
