mod connection;
mod news_repository;
mod source_repository;

pub use connection::SqliteStorage;
pub use news_repository::{SqliteNewsRepository, MAX_BULK_ROWS};
pub use source_repository::SqliteSourceRepository;
