use async_trait::async_trait;

use crate::errors::CacheError;

pub type CacheResult<T> = Result<T, CacheError>;

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` is a plain miss; `Err` means the backend itself failed.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores without expiry. Backends may still evict on their own.
    async fn set(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Removes every key starting with `prefix`, returning how many went.
    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<u64>;

    fn name(&self) -> &'static str;
}
