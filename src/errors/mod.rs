use std::time::Duration;

use thiserror::Error;

/// Failure of a single feed fetch. Absorbed by the collector; one broken
/// source never aborts the others.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Fetching {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Feed parsing failed: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum HubError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    // Catalog errors
    #[error("Source catalog unavailable: {0}")]
    Catalog(String),

    #[error("Source already exists: {0}")]
    SourceAlreadyExists(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    // Collection errors
    #[error("News collection timed out after {0:?}")]
    Timeout(Duration),

    #[error("Batch insert failed after {committed_batches} committed batches: {source}")]
    Persistence {
        committed_batches: usize,
        #[source]
        source: Box<HubError>,
    },

    #[error("Cache invalidation failed, cached listings may be stale: {0}")]
    CacheInvalidation(#[source] CacheError),

    // Read path errors
    #[error("News query failed: {0}")]
    Query(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OPML parsing failed: {0}")]
    OpmlParse(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HubResult<T> = Result<T, HubError>;
