pub mod traits;
pub mod sqlite;

pub use traits::{NewsRepository, SourceRepository};
pub use sqlite::{SqliteNewsRepository, SqliteSourceRepository, SqliteStorage};
