use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::RawFeedItem;
use crate::errors::FetchError;
use crate::sources::traits::FeedFetcher;

const USER_AGENT: &str = concat!("newshub/", env!("CARGO_PKG_VERSION"));

/// Fetches RSS, Atom and JSON feeds over HTTP.
pub struct RssAtomFetcher {
    client: Client,
}

impl RssAtomFetcher {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(request_timeout)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    async fn fetch_and_parse(&self, url: &str) -> Result<Vec<RawFeedItem>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Self::parse_items(&bytes)
    }

    pub(crate) fn parse_items(bytes: &[u8]) -> Result<Vec<RawFeedItem>, FetchError> {
        let parsed = parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;
        Ok(parsed.entries.into_iter().map(raw_item_from_entry).collect())
    }
}

impl Default for RssAtomFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

fn raw_item_from_entry(entry: feed_rs::model::Entry) -> RawFeedItem {
    let title = entry.title.map(|t| t.content).unwrap_or_default();
    let link = entry
        .links
        .into_iter()
        .next()
        .map(|l| l.href)
        .unwrap_or_default();

    let image = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .find(|uri| !uri.is_empty());

    let enclosure = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()));

    let html = entry
        .summary
        .map(|s| s.content)
        .filter(|s| !s.is_empty())
        .or_else(|| entry.content.and_then(|c| c.body));

    RawFeedItem {
        title,
        link,
        image,
        enclosure,
        html,
        published: entry.published.or(entry.updated),
    }
}

#[async_trait]
impl FeedFetcher for RssAtomFetcher {
    async fn fetch(&self, feed_url: &str, deadline: Instant) -> Result<Vec<RawFeedItem>, FetchError> {
        let started = Instant::now();
        debug!(url = feed_url, "fetching feed");

        match tokio::time::timeout_at(deadline, self.fetch_and_parse(feed_url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: feed_url.to_string(),
                after: started.elapsed(),
            }),
        }
    }
}
