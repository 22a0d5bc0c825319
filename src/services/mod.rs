pub mod batch_persister;
pub mod cache_invalidator;
pub mod collector_service;
pub mod import_export_service;
pub mod news_service;
pub mod source_service;

pub use batch_persister::{BatchPersister, PersistSummary};
pub use cache_invalidator::CacheInvalidator;
pub use collector_service::{CollectionReport, CollectionState, CollectorService, CollectorSettings};
pub use import_export_service::{ImportExportService, ImportResult};
pub use news_service::NewsService;
pub use source_service::SourceService;
