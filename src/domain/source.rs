use serde::{Deserialize, Serialize};

/// A remote feed registered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub id: i64,
    pub name: String,
    pub feed_url: String,
    pub tags: Option<String>,
    pub created_at: Option<String>,
}

/// A source that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSource {
    pub name: String,
    pub feed_url: String,
    pub tags: Option<String>,
}

impl NewSource {
    pub fn new(name: String, feed_url: String) -> Self {
        Self {
            name,
            feed_url,
            tags: None,
        }
    }

    pub fn with_tags(mut self, tags: Option<String>) -> Self {
        self.tags = tags.filter(|t| !t.trim().is_empty());
        self
    }
}
