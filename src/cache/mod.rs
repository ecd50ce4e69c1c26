//! Persistent result cache.
//!
//! [`CacheLocation`] decides where a project's cache lives;
//! [`ResultCacheStore`] reads and writes entries under it.

pub mod cache_location;
pub mod store;

pub use cache_location::{CacheLocation, CacheStrategy, CACHE_DIR_ENV};
pub use store::{escape_key, path_key, CacheEntry, CacheStats, Namespace, ResultCacheStore};
