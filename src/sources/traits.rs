use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::RawFeedItem;
use crate::errors::FetchError;

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse one feed. Must give up with `FetchError::Timeout`
    /// once `deadline` passes instead of returning partial data.
    async fn fetch(&self, feed_url: &str, deadline: Instant) -> Result<Vec<RawFeedItem>, FetchError>;
}
