use chrono::{DateTime, Utc};

use crate::domain::{FeedSource, NewSource, NewsRecord, NewsRow};
use crate::errors::HubResult;

#[cfg_attr(test, mockall::automock)]
pub trait SourceRepository: Send + Sync {
    fn add(&self, source: &NewSource) -> HubResult<i64>;
    fn remove(&self, id: i64) -> HubResult<bool>;
    fn get_all(&self) -> HubResult<Vec<FeedSource>>;
    fn get_page(&self, offset: u64, limit: u64) -> HubResult<Vec<FeedSource>>;
    fn exists(&self, name: &str, feed_url: &str) -> HubResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
pub trait NewsRepository: Send + Sync {
    /// Inserts all records in one statement, skipping links that already
    /// exist. Returns the number of rows actually inserted.
    fn bulk_insert(&self, records: &[NewsRecord], fetched_at: DateTime<Utc>) -> HubResult<usize>;

    /// Newest publish date first, restricted to `sources`.
    fn list_news(&self, sources: &[String], offset: u64, limit: u64) -> HubResult<Vec<NewsRow>>;

    fn remove_older_than(&self, cutoff: DateTime<Utc>) -> HubResult<usize>;

    fn distinct_sources(&self) -> HubResult<Vec<String>>;
}
