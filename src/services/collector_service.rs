use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::domain::{FeedSource, NewsRecord};
use crate::errors::{HubError, HubResult};
use crate::services::batch_persister::{BatchPersister, PersistSummary, DEFAULT_BATCH_SIZE};
use crate::services::cache_invalidator::CacheInvalidator;
use crate::sources::{normalize, FeedFetcher};
use crate::storage::traits::{NewsRepository, SourceRepository};

/// Lifecycle of one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionState {
    Idle,
    FetchingAll,
    Persisting,
    InvalidatingCache,
    Done,
    TimedOut,
    Failed,
}

impl CollectionState {
    pub fn can_transition_to(self, next: CollectionState) -> bool {
        use CollectionState::*;
        matches!(
            (self, next),
            (Idle, FetchingAll)
                | (Idle, Failed)
                | (FetchingAll, Persisting)
                | (FetchingAll, TimedOut)
                | (Persisting, InvalidatingCache)
                | (Persisting, Failed)
                | (InvalidatingCache, Done)
                | (InvalidatingCache, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CollectionState::Done | CollectionState::TimedOut | CollectionState::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionState::Idle => "idle",
            CollectionState::FetchingAll => "fetching_all",
            CollectionState::Persisting => "persisting",
            CollectionState::InvalidatingCache => "invalidating_cache",
            CollectionState::Done => "done",
            CollectionState::TimedOut => "timed_out",
            CollectionState::Failed => "failed",
        }
    }
}

impl fmt::Display for CollectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

struct RunTracker {
    state: CollectionState,
}

impl RunTracker {
    fn new() -> Self {
        Self {
            state: CollectionState::Idle,
        }
    }

    fn advance(&mut self, next: CollectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        if next.is_terminal() {
            info!(from = %self.state, to = %next, "collection finished");
        } else {
            debug!(from = %self.state, to = %next, "collection state");
        }
        self.state = next;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub state: CollectionState,
    pub sources: usize,
    pub failed_sources: usize,
    pub records: usize,
    pub persisted: PersistSummary,
    pub invalidated: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct CollectorSettings {
    pub fetch_timeout: Duration,
    pub collect_timeout: Duration,
    pub batch_size: usize,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            collect_timeout: Duration::from_secs(5 * 60),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl From<&Config> for CollectorSettings {
    fn from(config: &Config) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout,
            collect_timeout: config.collect_timeout,
            batch_size: config.batch_size,
        }
    }
}

enum SourceOutcome {
    Collected(usize),
    Failed,
    Cancelled,
}

/// Fans out one fetch+normalize task per source, then persists the merged
/// records and purges cached listings.
pub struct CollectorService<S: SourceRepository, N: NewsRepository> {
    source_repository: Arc<S>,
    fetcher: Arc<dyn FeedFetcher>,
    persister: BatchPersister<N>,
    invalidator: CacheInvalidator,
    settings: CollectorSettings,
}

impl<S: SourceRepository, N: NewsRepository + 'static> CollectorService<S, N> {
    pub fn new(
        source_repository: Arc<S>,
        news_repository: Arc<N>,
        fetcher: Arc<dyn FeedFetcher>,
        cache: Arc<dyn CacheStore>,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            source_repository,
            fetcher,
            persister: BatchPersister::new(news_repository, settings.batch_size),
            invalidator: CacheInvalidator::new(cache),
            settings,
        }
    }

    pub async fn collect(&self) -> HubResult<CollectionReport> {
        let mut run = RunTracker::new();

        let sources = match self.source_repository.get_all() {
            Ok(sources) => sources,
            Err(e) => {
                run.advance(CollectionState::Failed);
                return Err(match e {
                    HubError::Catalog(_) => e,
                    other => HubError::Catalog(other.to_string()),
                });
            }
        };

        run.advance(CollectionState::FetchingAll);
        info!(sources = sources.len(), "collecting news");

        let source_count = sources.len();
        let deadline = Instant::now() + self.settings.collect_timeout;
        let collected: Arc<Mutex<Vec<NewsRecord>>> =
            Arc::new(Mutex::new(Vec::with_capacity(source_count * 20)));

        let mut workers = JoinSet::new();
        for source in sources {
            workers.spawn(collect_source(
                Arc::clone(&self.fetcher),
                source,
                deadline,
                self.settings.fetch_timeout,
                Arc::clone(&collected),
            ));
        }

        let mut failed_sources = 0;
        let joined = tokio::time::timeout_at(deadline, async {
            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok(SourceOutcome::Collected(records)) => {
                        debug!(records, remaining = workers.len(), "worker finished")
                    }
                    Ok(SourceOutcome::Failed) | Ok(SourceOutcome::Cancelled) => failed_sources += 1,
                    Err(e) => {
                        warn!(error = %e, "collector task aborted");
                        failed_sources += 1;
                    }
                }
            }
        })
        .await;

        if joined.is_err() {
            workers.abort_all();
            run.advance(CollectionState::TimedOut);
            warn!(
                timeout = ?self.settings.collect_timeout,
                "collection timed out, discarding partial results"
            );
            return Err(HubError::Timeout(self.settings.collect_timeout));
        }

        let records = std::mem::take(&mut *collected.lock().unwrap_or_else(PoisonError::into_inner));
        let record_count = records.len();
        info!(records = record_count, failed_sources, "fetch phase finished");

        run.advance(CollectionState::Persisting);
        debug!(batch_size = self.persister.batch_size(), "persisting records");
        let persister = self.persister.clone();
        let persisted = tokio::task::spawn_blocking(move || persister.persist(&records))
            .await
            .map_err(|e| HubError::Io(e.into()))
            .and_then(|result| result);
        let persisted = match persisted {
            Ok(summary) => summary,
            Err(e) => {
                run.advance(CollectionState::Failed);
                return Err(e);
            }
        };

        run.advance(CollectionState::InvalidatingCache);
        let invalidated = match self.invalidator.invalidate().await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "news persisted but cache invalidation failed");
                run.advance(CollectionState::Failed);
                return Err(e);
            }
        };

        run.advance(CollectionState::Done);

        Ok(CollectionReport {
            state: run.state,
            sources: source_count,
            failed_sources,
            records: record_count,
            persisted,
            invalidated,
        })
    }
}

async fn collect_source(
    fetcher: Arc<dyn FeedFetcher>,
    source: FeedSource,
    deadline: Instant,
    fetch_timeout: Duration,
    collected: Arc<Mutex<Vec<NewsRecord>>>,
) -> SourceOutcome {
    let now = Instant::now();
    if now >= deadline {
        debug!(source = %source.name, "collection deadline passed before fetch");
        return SourceOutcome::Cancelled;
    }

    let source_deadline = (now + fetch_timeout).min(deadline);
    let items = match fetcher.fetch(&source.feed_url, source_deadline).await {
        Ok(items) => items,
        Err(e) => {
            warn!(source = %source.name, url = %source.feed_url, error = %e, "failed to fetch feed");
            return SourceOutcome::Failed;
        }
    };

    let mut local = Vec::with_capacity(items.len());
    for item in items {
        if Instant::now() >= source_deadline {
            debug!(source = %source.name, kept = local.len(), "deadline reached while normalizing");
            break;
        }
        local.push(normalize(item, &source.name));
    }

    let count = local.len();
    collected
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .extend(local);

    debug!(source = %source.name, records = count, "source collected");
    SourceOutcome::Collected(count)
}
