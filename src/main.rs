use std::fs;
use std::sync::Arc;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use newshub::cache::{CacheStore, MemoryCache, RedisCache};
use newshub::cli::{Cli, Commands, SourceCommands};
use newshub::config::Config;
use newshub::domain::NewsQuery;
use newshub::errors::{HubError, HubResult};
use newshub::services::{
    CollectorService, CollectorSettings, ImportExportService, NewsService, SourceService,
};
use newshub::sources::RssAtomFetcher;
use newshub::storage::sqlite::{SqliteNewsRepository, SqliteSourceRepository, SqliteStorage};

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newshub=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run() -> HubResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)?;
    let source_repo = Arc::new(SqliteSourceRepository::new(storage.clone()));
    let news_repo = Arc::new(SqliteNewsRepository::new(storage));

    match cli.command {
        Commands::Collect => {
            let cache = open_cache(&config, true).await?;
            cmd_collect(source_repo, news_repo, cache, &config).await
        }
        Commands::News {
            sources,
            page,
            limit,
            json,
        } => {
            let cache = open_cache(&config, false).await?;
            let query = NewsQuery::new(sources).with_page(page).with_limit(limit);
            cmd_news(news_repo, cache, query, json).await
        }
        Commands::Tags => {
            let cache = open_cache(&config, false).await?;
            cmd_tags(news_repo, cache)
        }
        Commands::Prune { days } => {
            let cache = open_cache(&config, true).await?;
            cmd_prune(news_repo, cache, days.unwrap_or(config.retention_days)).await
        }
        Commands::Source { command } => match command {
            SourceCommands::Add { name, url, tags } => cmd_source_add(source_repo, &name, &url, tags),
            SourceCommands::List { page, limit } => cmd_source_list(source_repo, page, limit),
            SourceCommands::Remove { id } => cmd_source_remove(source_repo, id),
            SourceCommands::Import { path } => cmd_source_import(source_repo, &path),
            SourceCommands::Export { output } => cmd_source_export(source_repo, output),
        },
    }
}

/// Redis when configured, otherwise the in-process cache. Writers need the
/// real backend so invalidation reaches it; readers may degrade.
async fn open_cache(config: &Config, strict: bool) -> HubResult<Arc<dyn CacheStore>> {
    let Some(url) = config.redis_url.as_deref() else {
        return Ok(Arc::new(MemoryCache::new()));
    };

    match RedisCache::connect(url, config.cache_timeout).await {
        Ok(cache) => Ok(Arc::new(cache)),
        Err(e) if strict => Err(HubError::CacheInvalidation(e)),
        Err(e) => {
            warn!(error = %e, "redis unavailable, continuing without shared cache");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

async fn cmd_collect(
    source_repo: Arc<SqliteSourceRepository>,
    news_repo: Arc<SqliteNewsRepository>,
    cache: Arc<dyn CacheStore>,
    config: &Config,
) -> HubResult<()> {
    let fetcher = Arc::new(RssAtomFetcher::new(config.fetch_timeout));
    let collector = CollectorService::new(
        source_repo,
        news_repo,
        fetcher,
        cache,
        CollectorSettings::from(config),
    );

    println!("Collecting news...\n");

    let report = collector.collect().await?;

    if report.sources == 0 {
        println!("No sources configured.");
        return Ok(());
    }

    println!(
        "Fetched {} items from {} sources ({} failed).",
        report.records,
        report.sources - report.failed_sources,
        report.failed_sources
    );
    println!(
        "Stored {} new items in {} batches, skipped {} already known.",
        report.persisted.inserted, report.persisted.batches, report.persisted.skipped
    );

    Ok(())
}

async fn cmd_news(
    news_repo: Arc<SqliteNewsRepository>,
    cache: Arc<dyn CacheStore>,
    query: NewsQuery,
    json: bool,
) -> HubResult<()> {
    let service = NewsService::new(news_repo, cache);
    let items = service.query(query).await?;

    if json {
        let out = serde_json::to_string_pretty(&items)
            .map_err(|e| HubError::Query(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    if items.is_empty() {
        println!("No news found.");
        return Ok(());
    }

    for item in items {
        let published = item
            .published_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "undated".to_string());
        println!("[{}] {} ({})", published, item.title, item.source);
        println!("    {}", item.link);
    }

    Ok(())
}

fn cmd_tags(news_repo: Arc<SqliteNewsRepository>, cache: Arc<dyn CacheStore>) -> HubResult<()> {
    let service = NewsService::new(news_repo, cache);
    let tags = service.tags()?;

    if tags.is_empty() {
        println!("No news stored yet.");
        return Ok(());
    }

    for tag in tags {
        println!("{}", tag);
    }
    Ok(())
}

async fn cmd_prune(
    news_repo: Arc<SqliteNewsRepository>,
    cache: Arc<dyn CacheStore>,
    days: i64,
) -> HubResult<()> {
    let service = NewsService::new(news_repo, cache);
    let removed = service.remove_old_news(days).await?;
    println!("Removed {} items older than {} days.", removed, days);
    Ok(())
}

fn cmd_source_add(
    source_repo: Arc<SqliteSourceRepository>,
    name: &str,
    url: &str,
    tags: Option<String>,
) -> HubResult<()> {
    let service = SourceService::new(source_repo);

    match service.add(name, url, tags) {
        Ok(source) => {
            println!("Source added successfully!");
            println!("  Id: {}", source.id);
            println!("  Name: {}", source.name);
            println!("  Feed: {}", source.feed_url);
            Ok(())
        }
        Err(HubError::SourceAlreadyExists(_)) => {
            println!("Source already exists: {}", url);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_source_list(
    source_repo: Arc<SqliteSourceRepository>,
    page: Option<u64>,
    limit: u64,
) -> HubResult<()> {
    let service = SourceService::new(source_repo);
    let sources = match page {
        Some(page) => service.list_page(page.saturating_sub(1).saturating_mul(limit), limit)?,
        None => service.list()?,
    };

    if sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    println!("Configured sources:\n");
    for source in sources {
        println!("  {}. {}", source.id, source.name);
        println!("    Feed: {}", source.feed_url);
        if let Some(tags) = source.tags {
            println!("    Tags: {}", tags);
        }
        println!();
    }

    Ok(())
}

fn cmd_source_remove(source_repo: Arc<SqliteSourceRepository>, id: i64) -> HubResult<()> {
    let service = SourceService::new(source_repo);
    service.remove(id)?;
    println!("Removed source {}", id);
    Ok(())
}

fn cmd_source_import(source_repo: Arc<SqliteSourceRepository>, path: &str) -> HubResult<()> {
    let content = fs::read_to_string(path)?;
    let service = ImportExportService::new(source_repo);

    println!("Importing sources from {}...\n", path);

    let result = service.import_opml(&content)?;

    if !result.added.is_empty() {
        println!("Added {} sources:", result.added.len());
        for source in &result.added {
            println!("  + {} ({})", source.name, source.feed_url);
        }
        println!();
    }

    if !result.duplicates.is_empty() {
        println!("Skipped {} duplicates:", result.duplicates.len());
        for url in &result.duplicates {
            println!("  - {}", url);
        }
        println!();
    }

    if !result.invalid.is_empty() {
        println!("Failed {} sources:", result.invalid.len());
        for (url, error) in &result.invalid {
            println!("  ! {}: {}", url, error);
        }
        println!();
    }

    println!(
        "Import complete: {} added, {} duplicates, {} failed",
        result.added.len(),
        result.duplicates.len(),
        result.invalid.len()
    );

    Ok(())
}

fn cmd_source_export(
    source_repo: Arc<SqliteSourceRepository>,
    output: Option<String>,
) -> HubResult<()> {
    let service = ImportExportService::new(source_repo);
    let opml = service.export_opml()?;

    match output {
        Some(path) => {
            fs::write(&path, &opml)?;
            println!("Exported sources to {}", path);
        }
        None => {
            println!("{}", opml);
        }
    }

    Ok(())
}
