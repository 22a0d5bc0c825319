pub mod news;
pub mod query;
pub mod source;

pub use news::{NewsItem, NewsRecord, NewsRow, RawFeedItem};
pub use query::{ListingQuery, NewsQuery, DEFAULT_LIMIT, MAX_LIMIT};
pub use source::{FeedSource, NewSource};
