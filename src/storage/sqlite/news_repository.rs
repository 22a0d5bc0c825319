use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::ToSql;

use crate::domain::news::{timestamp_from_text, timestamp_to_text};
use crate::domain::{NewsRecord, NewsRow};
use crate::errors::{HubError, HubResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::NewsRepository;

const COLUMNS_PER_ROW: usize = 5;

/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER`.
const MAX_BIND_VARIABLES: usize = 32766;

/// Largest row count one bulk insert can bind, leaving `?1` for the fetch time.
pub const MAX_BULK_ROWS: usize = (MAX_BIND_VARIABLES - 1) / COLUMNS_PER_ROW;

pub struct SqliteNewsRepository {
    storage: SqliteStorage,
}

impl SqliteNewsRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NewsRow> {
        let link: Option<String> = row.get(2)?;
        let publish_date: Option<String> = row.get(5)?;
        let fetched_at: String = row.get(6)?;

        let published_at = match publish_date {
            Some(text) => Some(parse_column(5, &text)?),
            None => None,
        };

        Ok(NewsRow {
            id: row.get(0)?,
            record: NewsRecord {
                title: row.get(1)?,
                link: link.unwrap_or_default(),
                source: row.get(3)?,
                image_url: row.get(4)?,
                published_at,
            },
            fetched_at: parse_column(6, &fetched_at)?,
        })
    }

    /// One multi-row statement: `(?2..?6), (?7..?11), ...` with `?1` as the
    /// shared fetch time.
    fn bulk_insert_sql(rows: usize) -> String {
        let mut sql = String::with_capacity(96 + rows * 40);
        sql.push_str(
            "INSERT INTO news (title, link, source, image_url, publish_date, fetched_at) VALUES ",
        );
        for i in 0..rows {
            if i > 0 {
                sql.push(',');
            }
            let p = i * COLUMNS_PER_ROW + 2;
            // writing into a String cannot fail
            let _ = write!(
                sql,
                "(?{}, NULLIF(?{}, ''), ?{}, ?{}, ?{}, ?1)",
                p,
                p + 1,
                p + 2,
                p + 3,
                p + 4
            );
        }
        sql.push_str(" ON CONFLICT(link) DO NOTHING");
        sql
    }
}

fn parse_column(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    timestamp_from_text(text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp '{}'", text).into(),
        )
    })
}

impl NewsRepository for SqliteNewsRepository {
    fn bulk_insert(&self, records: &[NewsRecord], fetched_at: DateTime<Utc>) -> HubResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let fetched_at = timestamp_to_text(&fetched_at);
        let published: Vec<Option<String>> = records
            .iter()
            .map(|r| r.published_at.as_ref().map(timestamp_to_text))
            .collect();

        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(records.len() * COLUMNS_PER_ROW + 1);
        params.push(&fetched_at);
        for (record, published) in records.iter().zip(&published) {
            params.push(&record.title);
            params.push(&record.link);
            params.push(&record.source);
            params.push(&record.image_url);
            params.push(published);
        }

        let sql = Self::bulk_insert_sql(records.len());
        let conn = self.storage.connection()?;
        let inserted = conn.execute(&sql, params.as_slice())?;
        Ok(inserted)
    }

    fn list_news(&self, sources: &[String], offset: u64, limit: u64) -> HubResult<Vec<NewsRow>> {
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: Vec<String> = (0..sources.len()).map(|i| format!("?{}", i + 3)).collect();
        let query = format!(
            "SELECT id, title, link, source, image_url, publish_date, fetched_at FROM news \
             WHERE source IN ({}) \
             ORDER BY publish_date IS NULL, publish_date DESC, id DESC \
             LIMIT ?1 OFFSET ?2",
            placeholders.join(", ")
        );

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(sources.len() + 2);
        params.push(&limit);
        params.push(&offset);
        params.extend(sources.iter().map(|s| s as &dyn ToSql));

        let conn = self.storage.connection()?;
        let mut stmt = conn
            .prepare(&query)
            .map_err(|e| HubError::Query(e.to_string()))?;
        let rows = stmt
            .query_map(params.as_slice(), Self::map_row)
            .map_err(|e| HubError::Query(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| HubError::Query(e.to_string()))
    }

    fn remove_older_than(&self, cutoff: DateTime<Utc>) -> HubResult<usize> {
        let conn = self.storage.connection()?;
        let removed = conn.execute(
            "DELETE FROM news WHERE COALESCE(publish_date, fetched_at) < ?1",
            [timestamp_to_text(&cutoff)],
        )?;
        Ok(removed)
    }

    fn distinct_sources(&self) -> HubResult<Vec<String>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT DISTINCT source FROM news ORDER BY source ASC")?;
        let sources = stmt.query_map([], |row| row.get(0))?;

        sources.collect::<Result<Vec<_>, _>>().map_err(HubError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn setup_repo() -> SqliteNewsRepository {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteNewsRepository::new(storage)
    }

    fn record(link: &str, source: &str, day: Option<u32>) -> NewsRecord {
        NewsRecord {
            title: format!("Title {}", link),
            link: link.to_string(),
            source: source.to_string(),
            image_url: None,
            published_at: day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 8, 0, 0).unwrap()),
        }
    }

    fn sources(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bulk_insert_sql_placeholders() {
        let sql = SqliteNewsRepository::bulk_insert_sql(2);
        assert!(sql.contains("(?2, NULLIF(?3, ''), ?4, ?5, ?6, ?1),(?7, NULLIF(?8, ''), ?9, ?10, ?11, ?1)"));
        assert!(sql.ends_with("ON CONFLICT(link) DO NOTHING"));
    }

    #[test]
    fn test_bulk_insert_at_bind_limit() {
        let repo = setup_repo();
        let rows: Vec<NewsRecord> = (0..MAX_BULK_ROWS)
            .map(|i| record(&format!("https://bulk/{}", i), "MacThai", None))
            .collect();

        assert_eq!(MAX_BULK_ROWS, 6553);
        assert_eq!(repo.bulk_insert(&rows, Utc::now()).unwrap(), MAX_BULK_ROWS);
    }

    #[test]
    fn test_bulk_insert_skips_existing_links() {
        let repo = setup_repo();
        let now = Utc::now();

        let first = vec![record("https://a", "MacThai", Some(1)), record("https://b", "MacThai", Some(2))];
        assert_eq!(repo.bulk_insert(&first, now).unwrap(), 2);

        let second = vec![record("https://b", "DroidSans", Some(3)), record("https://c", "DroidSans", Some(4))];
        assert_eq!(repo.bulk_insert(&second, now).unwrap(), 1);

        let rows = repo.list_news(&sources(&["MacThai", "DroidSans"]), 0, 10).unwrap();
        assert_eq!(rows.len(), 3);
        let b = rows.iter().find(|r| r.record.link == "https://b").unwrap();
        assert_eq!(b.record.source, "MacThai", "first write for a link wins");
    }

    #[test]
    fn test_duplicates_within_one_batch_are_skipped() {
        let repo = setup_repo();
        let batch = vec![record("https://same", "A", Some(1)), record("https://same", "B", Some(2))];

        assert_eq!(repo.bulk_insert(&batch, Utc::now()).unwrap(), 1);
    }

    #[test]
    fn test_empty_links_never_collide() {
        let repo = setup_repo();
        let batch = vec![record("", "A", Some(1)), record("", "A", Some(2))];

        assert_eq!(repo.bulk_insert(&batch, Utc::now()).unwrap(), 2);
        let rows = repo.list_news(&sources(&["A"]), 0, 10).unwrap();
        assert!(rows.iter().all(|r| r.record.link.is_empty()));
    }

    #[test]
    fn test_list_news_filters_orders_and_pages() {
        let repo = setup_repo();
        let batch = vec![
            record("https://1", "MacThai", Some(1)),
            record("https://2", "DroidSans", Some(5)),
            record("https://3", "Other", Some(9)),
            record("https://4", "MacThai", None),
            record("https://5", "MacThai", Some(3)),
        ];
        repo.bulk_insert(&batch, Utc::now()).unwrap();

        let rows = repo.list_news(&sources(&["MacThai", "DroidSans"]), 0, 10).unwrap();
        let links: Vec<&str> = rows.iter().map(|r| r.record.link.as_str()).collect();
        assert_eq!(links, vec!["https://2", "https://5", "https://1", "https://4"]);

        let page_two = repo.list_news(&sources(&["MacThai", "DroidSans"]), 2, 2).unwrap();
        let links: Vec<&str> = page_two.iter().map(|r| r.record.link.as_str()).collect();
        assert_eq!(links, vec!["https://1", "https://4"]);
    }

    #[test]
    fn test_remove_older_than() {
        let repo = setup_repo();
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let batch = vec![record("https://old", "A", Some(1)), record("https://new", "A", Some(20))];
        repo.bulk_insert(&batch, now).unwrap();

        let removed = repo.remove_older_than(now - Duration::days(15)).unwrap();
        assert_eq!(removed, 1);

        let rows = repo.list_news(&sources(&["A"]), 0, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.link, "https://new");
    }

    #[test]
    fn test_undated_rows_age_by_fetch_time() {
        let repo = setup_repo();
        let fetched = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        repo.bulk_insert(&[record("https://undated", "A", None)], fetched).unwrap();

        let removed = repo.remove_older_than(fetched + Duration::days(1)).unwrap();
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_distinct_sources() {
        let repo = setup_repo();
        let batch = vec![
            record("https://1", "MacThai", Some(1)),
            record("https://2", "DroidSans", Some(2)),
            record("https://3", "MacThai", Some(3)),
        ];
        repo.bulk_insert(&batch, Utc::now()).unwrap();

        assert_eq!(repo.distinct_sources().unwrap(), sources(&["DroidSans", "MacThai"]));
    }
}
