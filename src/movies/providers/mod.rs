//! Movie catalog implementations

pub mod tmdb_provider;

pub use tmdb_provider::{TmdbConfig, TmdbProvider};
