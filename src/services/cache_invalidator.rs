use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheStore, NEWS_PREFIX};
use crate::errors::{HubError, HubResult};

/// Purges every cached news listing.
#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Arc<dyn CacheStore>,
    prefix: String,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self::with_prefix(cache, NEWS_PREFIX)
    }

    pub fn with_prefix(cache: Arc<dyn CacheStore>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    /// A failure here means storage is ahead of the cache; callers should
    /// retry the invalidation, nothing was lost.
    pub async fn invalidate(&self) -> HubResult<u64> {
        let removed = self
            .cache
            .delete_by_prefix(&self.prefix)
            .await
            .map_err(HubError::CacheInvalidation)?;

        info!(prefix = %self.prefix, removed, backend = self.cache.name(), "cache invalidated");
        Ok(removed)
    }
}
