use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An entry as it came out of a parsed feed, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeedItem {
    pub title: String,
    /// May hold several candidates separated by `|`.
    pub link: String,
    pub image: Option<String>,
    pub enclosure: Option<String>,
    /// Description HTML, or the content body when the entry has no description.
    pub html: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl RawFeedItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn with_enclosure(mut self, enclosure: Option<String>) -> Self {
        self.enclosure = enclosure;
        self
    }

    pub fn with_html(mut self, html: Option<String>) -> Self {
        self.html = html;
        self
    }

    pub fn with_published(mut self, published: Option<DateTime<Utc>>) -> Self {
        self.published = published;
        self
    }
}

/// Canonical news record. `link` is the dedupe key across all runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub title: String,
    pub link: String,
    pub source: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A stored news record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRow {
    pub id: i64,
    pub record: NewsRecord,
    pub fetched_at: DateTime<Utc>,
}

/// Listing entry returned to readers and stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<NewsRow> for NewsItem {
    fn from(row: NewsRow) -> Self {
        let NewsRecord {
            title,
            link,
            source,
            image_url,
            published_at,
        } = row.record;
        Self {
            title,
            source,
            published_at,
            link,
            image: image_url,
        }
    }
}

/// Storage text form for timestamps. Fixed precision keeps lexical order
/// equal to chronological order.
pub fn timestamp_to_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn timestamp_from_text(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
