use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::cache::{listing_key, CacheStore};
use crate::domain::{ListingQuery, NewsItem, NewsQuery};
use crate::errors::{HubError, HubResult};
use crate::services::cache_invalidator::CacheInvalidator;
use crate::storage::traits::NewsRepository;

/// Cache-aside reads over the news table. Cache trouble is logged and
/// routed around; only bad input or storage failure reach the caller.
pub struct NewsService<N: NewsRepository> {
    repository: Arc<N>,
    cache: Arc<dyn CacheStore>,
    invalidator: CacheInvalidator,
}

impl<N: NewsRepository> NewsService<N> {
    pub fn new(repository: Arc<N>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            repository,
            invalidator: CacheInvalidator::new(Arc::clone(&cache)),
            cache,
        }
    }

    pub async fn query(&self, request: NewsQuery) -> HubResult<Vec<NewsItem>> {
        let query = request.normalize()?;
        let key = listing_key(&query);
        debug!(key = %key, "news listing requested");

        if let Some(items) = self.cached(&key).await {
            return Ok(items);
        }

        let items = self.load(&query)?;

        if !items.is_empty() {
            self.store(&key, &items).await;
        }

        Ok(items)
    }

    /// Source names that have at least one stored item.
    pub fn tags(&self) -> HubResult<Vec<String>> {
        self.repository.distinct_sources()
    }

    /// Deletes news older than `retention_days` and purges cached listings
    /// when anything was removed.
    pub async fn remove_old_news(&self, retention_days: i64) -> HubResult<usize> {
        if retention_days <= 0 {
            return Err(HubError::InvalidRequest(
                "retention days must be positive".to_string(),
            ));
        }
        let cutoff = Duration::try_days(retention_days)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                HubError::InvalidRequest(format!("retention of {} days is out of range", retention_days))
            })?;

        let removed = self.repository.remove_older_than(cutoff)?;
        info!(removed, cutoff = %cutoff, "retention sweep finished");

        if removed > 0 {
            self.invalidator.invalidate().await?;
        }
        Ok(removed)
    }

    async fn cached(&self, key: &str) -> Option<Vec<NewsItem>> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<NewsItem>>(&raw) {
                Ok(items) if !items.is_empty() => {
                    debug!(key, count = items.len(), "cache hit");
                    Some(items)
                }
                Ok(_) => None,
                Err(e) => {
                    warn!(key, error = %e, "discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key, backend = self.cache.name(), error = %e, "cache read failed, using storage");
                None
            }
        }
    }

    /// Runs inline on the async worker: one indexed page of at most
    /// `MAX_LIMIT` rows.
    fn load(&self, query: &ListingQuery) -> HubResult<Vec<NewsItem>> {
        let rows = self
            .repository
            .list_news(&query.sources, query.offset(), query.limit as u64)?;

        Ok(rows.into_iter().map(NewsItem::from).collect())
    }

    async fn store(&self, key: &str, items: &[NewsItem]) {
        let payload = match serde_json::to_string(items) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "could not encode listing for cache");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &payload).await {
            warn!(key, backend = self.cache.name(), error = %e, "cache write failed");
        }
    }
}
