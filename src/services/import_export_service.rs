use std::sync::Arc;

use opml::{Outline, OPML};

use crate::domain::FeedSource;
use crate::errors::{HubError, HubResult};
use crate::services::source_service::validate;
use crate::storage::traits::SourceRepository;

pub struct ImportResult {
    pub added: Vec<FeedSource>,
    pub invalid: Vec<(String, String)>, // (url, error_message)
    pub duplicates: Vec<String>,
}

/// A feed outline found while walking an OPML body.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OutlineFeed {
    name: String,
    url: String,
    tags: Option<String>,
}

pub struct ImportExportService<R: SourceRepository> {
    repository: Arc<R>,
}

impl<R: SourceRepository> ImportExportService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Import sources from OPML content
    pub fn import_opml(&self, content: &str) -> HubResult<ImportResult> {
        let opml = OPML::from_str(content).map_err(|e| HubError::OpmlParse(e.to_string()))?;

        let mut result = ImportResult {
            added: Vec::new(),
            invalid: Vec::new(),
            duplicates: Vec::new(),
        };

        for feed in extract_feeds(&opml.body.outlines) {
            let source = match validate(&feed.name, &feed.url) {
                Ok(source) => source.with_tags(feed.tags),
                Err(e) => {
                    result.invalid.push((feed.url, e.to_string()));
                    continue;
                }
            };

            if self.repository.exists(&source.name, &source.feed_url)? {
                result.duplicates.push(feed.url);
                continue;
            }

            match self.repository.add(&source) {
                Ok(id) => result.added.push(FeedSource {
                    id,
                    name: source.name,
                    feed_url: source.feed_url,
                    tags: source.tags,
                    created_at: None,
                }),
                Err(HubError::SourceAlreadyExists(_)) => result.duplicates.push(feed.url),
                Err(e) => result.invalid.push((feed.url, e.to_string())),
            }
        }

        Ok(result)
    }

    /// Export sources to OPML format
    pub fn export_opml(&self) -> HubResult<String> {
        let sources = self.repository.get_all()?;

        let mut opml = OPML::default();
        opml.head = Some(opml::Head {
            title: Some("Newshub Sources".to_string()),
            ..Default::default()
        });

        for source in sources {
            let outline = Outline {
                text: source.name.clone(),
                r#type: Some("rss".to_string()),
                xml_url: Some(source.feed_url),
                title: Some(source.name),
                category: source.tags,
                ..Default::default()
            };
            opml.body.outlines.push(outline);
        }

        opml.to_string().map_err(|e| HubError::OpmlParse(e.to_string()))
    }
}

/// Recursively collects feed outlines. Category outlines contribute their
/// text as the tag for feeds beneath them unless a feed names its own.
fn extract_feeds(outlines: &[Outline]) -> Vec<OutlineFeed> {
    fn walk(outlines: &[Outline], inherited: Option<&str>, out: &mut Vec<OutlineFeed>) {
        for outline in outlines {
            match outline.xml_url.as_deref().filter(|u| !u.is_empty()) {
                Some(url) => {
                    let name = outline
                        .title
                        .as_deref()
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or(&outline.text)
                        .to_string();
                    let tags = outline
                        .category
                        .clone()
                        .or_else(|| inherited.map(str::to_string));
                    out.push(OutlineFeed {
                        name,
                        url: url.to_string(),
                        tags,
                    });
                    walk(&outline.outlines, inherited, out);
                }
                None => walk(&outline.outlines, Some(outline.text.as_str()), out),
            }
        }
    }

    let mut feeds = Vec::new();
    walk(outlines, None, &mut feeds);
    feeds
}
