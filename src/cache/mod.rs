//! Cache backends for listing results.
//!
//! Keys live under [`keys::NEWS_PREFIX`] so a single prefix delete purges
//! every cached listing after new records are persisted.

pub mod keys;
pub mod memory;
pub mod redis_cache;
pub mod traits;

pub use keys::{listing_key, NEWS_PREFIX};
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use traits::{CacheResult, CacheStore};
