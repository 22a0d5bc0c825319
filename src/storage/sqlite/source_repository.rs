use crate::domain::{FeedSource, NewSource};
use crate::errors::{HubError, HubResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::SourceRepository;

const SELECT_SOURCES: &str = "SELECT id, name, feed_url, tags, created_at FROM sources";

pub struct SqliteSourceRepository {
    storage: SqliteStorage,
}

impl SqliteSourceRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeedSource> {
        Ok(FeedSource {
            id: row.get(0)?,
            name: row.get(1)?,
            feed_url: row.get(2)?,
            tags: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl SourceRepository for SqliteSourceRepository {
    fn add(&self, source: &NewSource) -> HubResult<i64> {
        let conn = self.storage.connection()?;

        // Check within the same connection to avoid deadlock
        let mut stmt =
            conn.prepare("SELECT EXISTS(SELECT 1 FROM sources WHERE name = ?1 OR feed_url = ?2)")?;
        let exists: bool = stmt.query_row((&source.name, &source.feed_url), |row| row.get(0))?;
        drop(stmt);

        if exists {
            return Err(HubError::SourceAlreadyExists(source.feed_url.clone()));
        }

        conn.execute(
            "INSERT INTO sources (name, feed_url, tags) VALUES (?1, ?2, ?3)",
            (&source.name, &source.feed_url, &source.tags),
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn remove(&self, id: i64) -> HubResult<bool> {
        let conn = self.storage.connection()?;
        let removed = conn.execute("DELETE FROM sources WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    fn get_all(&self) -> HubResult<Vec<FeedSource>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC", SELECT_SOURCES))?;
        let sources = stmt.query_map([], Self::map_row)?;

        sources
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HubError::Catalog(e.to_string()))
    }

    fn get_page(&self, offset: u64, limit: u64) -> HubResult<Vec<FeedSource>> {
        let conn = self.storage.connection()?;
        let mut stmt =
            conn.prepare(&format!("{} ORDER BY id ASC LIMIT ?1 OFFSET ?2", SELECT_SOURCES))?;
        // SQLite reads a negative LIMIT as "no limit", so never wrap
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let sources = stmt.query_map([limit, offset], Self::map_row)?;

        sources.collect::<Result<Vec<_>, _>>().map_err(HubError::from)
    }

    fn exists(&self, name: &str, feed_url: &str) -> HubResult<bool> {
        let conn = self.storage.connection()?;
        let mut stmt =
            conn.prepare("SELECT EXISTS(SELECT 1 FROM sources WHERE name = ?1 OR feed_url = ?2)")?;
        let exists: bool = stmt.query_row((name, feed_url), |row| row.get(0))?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> SqliteSourceRepository {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteSourceRepository::new(storage)
    }

    fn source(name: &str, url: &str) -> NewSource {
        NewSource::new(name.to_string(), url.to_string())
    }

    #[test]
    fn test_add_and_list_sources() {
        let repo = setup_repo();

        let id = repo
            .add(&source("MacThai", "https://www.macthai.com/feed/").with_tags(Some("tech".to_string())))
            .unwrap();
        assert!(id > 0);

        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "MacThai");
        assert_eq!(all[0].tags.as_deref(), Some("tech"));
    }

    #[test]
    fn test_duplicate_name_or_url_rejected() {
        let repo = setup_repo();
        repo.add(&source("MacThai", "https://www.macthai.com/feed/")).unwrap();

        let same_url = repo.add(&source("Other", "https://www.macthai.com/feed/"));
        assert!(matches!(same_url, Err(HubError::SourceAlreadyExists(_))));

        let same_name = repo.add(&source("MacThai", "https://elsewhere.example/feed"));
        assert!(matches!(same_name, Err(HubError::SourceAlreadyExists(_))));
    }

    #[test]
    fn test_remove_source() {
        let repo = setup_repo();
        let id = repo.add(&source("DroidSans", "https://droidsans.com/feed/")).unwrap();

        assert!(repo.remove(id).unwrap());
        assert!(!repo.remove(id).unwrap());
        assert!(repo.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_get_page() {
        let repo = setup_repo();
        for i in 0..5 {
            repo.add(&source(&format!("Source {}", i), &format!("https://s{}.example/feed", i)))
                .unwrap();
        }

        let page = repo.get_page(2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Source 2");
        assert_eq!(page[1].name, "Source 3");

        assert!(repo.get_page(10, 2).unwrap().is_empty());
    }

    #[test]
    fn test_get_page_far_past_the_end() {
        let repo = setup_repo();
        repo.add(&source("MacThai", "https://www.macthai.com/feed/")).unwrap();

        assert!(repo.get_page(u64::MAX, u64::MAX).unwrap().is_empty());
        assert_eq!(repo.get_page(0, u64::MAX).unwrap().len(), 1);
    }

    #[test]
    fn test_exists() {
        let repo = setup_repo();
        assert!(!repo.exists("MacThai", "https://www.macthai.com/feed/").unwrap());
        repo.add(&source("MacThai", "https://www.macthai.com/feed/")).unwrap();
        assert!(repo.exists("MacThai", "https://unused.example").unwrap());
    }
}
