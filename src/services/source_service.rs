use std::sync::Arc;

use url::Url;

use crate::domain::{FeedSource, NewSource};
use crate::errors::{HubError, HubResult};
use crate::storage::traits::SourceRepository;

pub struct SourceService<R: SourceRepository> {
    repository: Arc<R>,
}

impl<R: SourceRepository> SourceService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Validates and stores a new source
    pub fn add(&self, name: &str, feed_url: &str, tags: Option<String>) -> HubResult<FeedSource> {
        let source = validate(name, feed_url)?.with_tags(tags);
        let id = self.repository.add(&source)?;

        Ok(FeedSource {
            id,
            name: source.name,
            feed_url: source.feed_url,
            tags: source.tags,
            created_at: None,
        })
    }

    pub fn remove(&self, id: i64) -> HubResult<()> {
        if self.repository.remove(id)? {
            Ok(())
        } else {
            Err(HubError::SourceNotFound(id.to_string()))
        }
    }

    pub fn list(&self) -> HubResult<Vec<FeedSource>> {
        self.repository.get_all()
    }

    pub fn list_page(&self, offset: u64, limit: u64) -> HubResult<Vec<FeedSource>> {
        self.repository.get_page(offset, limit)
    }
}

/// Trims the name and requires an absolute http(s) feed URL.
pub fn validate(name: &str, feed_url: &str) -> HubResult<NewSource> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HubError::InvalidRequest("source name is required".to_string()));
    }

    let feed_url = feed_url.trim();
    let parsed = Url::parse(feed_url).map_err(|e| HubError::InvalidUrl(format!("{}: {}", feed_url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(HubError::InvalidUrl(feed_url.to_string()));
    }

    Ok(NewSource::new(name.to_string(), feed_url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::{SqliteSourceRepository, SqliteStorage};

    fn setup() -> SourceService<SqliteSourceRepository> {
        let storage = SqliteStorage::in_memory().unwrap();
        SourceService::new(Arc::new(SqliteSourceRepository::new(storage)))
    }

    #[test]
    fn test_list_empty() {
        let service = setup();
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_add_trims_and_stores() {
        let service = setup();
        let source = service
            .add("  MacThai ", " https://www.macthai.com/feed/ ", Some("apple".to_string()))
            .unwrap();

        assert!(source.id > 0);
        assert_eq!(source.name, "MacThai");
        assert_eq!(source.feed_url, "https://www.macthai.com/feed/");
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let service = setup();

        assert!(matches!(service.add("", "https://a.example/feed", None), Err(HubError::InvalidRequest(_))));
        assert!(matches!(service.add("A", "not a url", None), Err(HubError::InvalidUrl(_))));
        assert!(matches!(service.add("A", "ftp://a.example/feed", None), Err(HubError::InvalidUrl(_))));
    }

    #[test]
    fn test_add_duplicate() {
        let service = setup();
        service.add("MacThai", "https://www.macthai.com/feed/", None).unwrap();

        let result = service.add("MacThai", "https://www.macthai.com/feed/", None);
        assert!(matches!(result, Err(HubError::SourceAlreadyExists(_))));
    }

    #[test]
    fn test_remove_unknown_source() {
        let service = setup();
        assert!(matches!(service.remove(42), Err(HubError::SourceNotFound(_))));
    }

    #[test]
    fn test_list_page() {
        let service = setup();
        for name in ["A", "B", "C"] {
            service
                .add(name, &format!("https://{}.example/feed", name.to_lowercase()), None)
                .unwrap();
        }

        let page = service.list_page(1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "B");
    }
}
