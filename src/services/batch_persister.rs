use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use crate::domain::NewsRecord;
use crate::errors::{HubError, HubResult};
use crate::storage::sqlite::MAX_BULK_ROWS;
use crate::storage::traits::NewsRepository;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Larger batches would overflow SQLite's bind variable limit.
pub const MAX_BATCH_SIZE: usize = MAX_BULK_ROWS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub batches: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Writes records in fixed-size batches, one multi-row insert each.
/// Duplicate links are skipped by storage, never checked up front.
pub struct BatchPersister<N: NewsRepository> {
    repository: Arc<N>,
    batch_size: usize,
}

impl<N: NewsRepository> Clone for BatchPersister<N> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            batch_size: self.batch_size,
        }
    }
}

impl<N: NewsRepository> BatchPersister<N> {
    pub fn new(repository: Arc<N>, batch_size: usize) -> Self {
        Self {
            repository,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Stops at the first failing batch. Earlier batches stay committed and
    /// their count is reported in `HubError::Persistence`.
    pub fn persist(&self, records: &[NewsRecord]) -> HubResult<PersistSummary> {
        let mut summary = PersistSummary::default();

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            let inserted = self
                .repository
                .bulk_insert(batch, Utc::now())
                .map_err(|e| {
                    error!(batch = index, committed = summary.batches, error = %e, "batch insert failed");
                    HubError::Persistence {
                        committed_batches: summary.batches,
                        source: Box::new(e),
                    }
                })?;

            debug!(batch = index, rows = batch.len(), inserted, "batch committed");
            summary.batches += 1;
            summary.inserted += inserted;
            summary.skipped += batch.len() - inserted.min(batch.len());
        }

        Ok(summary)
    }
}
