use std::time::Duration;

use crate::errors::{HubError, HubResult};
use crate::services::batch_persister::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_COLLECT_TIMEOUT_SECS: u64 = 5 * 60;
const DEFAULT_RETENTION_DAYS: i64 = 30;
const DEFAULT_CACHE_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub redis_url: Option<String>,
    pub fetch_timeout: Duration,
    pub collect_timeout: Duration,
    pub cache_timeout: Duration,
    pub batch_size: usize,
    pub retention_days: i64,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> HubResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok(), exe_dir)
    }

    fn from_lookup<F>(lookup: F, exe_dir: Option<std::path::PathBuf>) -> HubResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Default db_path is relative to executable directory
        let db_path = lookup("NEWSHUB_DB_PATH").unwrap_or_else(|| {
            exe_dir
                .map(|d| d.join("newshub.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./newshub.db".to_string())
        });

        let redis_url = lookup("NEWSHUB_REDIS_URL").filter(|url| !url.trim().is_empty());

        let fetch_timeout = Duration::from_secs(positive(
            &lookup,
            "NEWSHUB_FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?);
        let collect_timeout = Duration::from_secs(positive(
            &lookup,
            "NEWSHUB_COLLECT_TIMEOUT_SECS",
            DEFAULT_COLLECT_TIMEOUT_SECS,
        )?);
        let cache_timeout = Duration::from_millis(positive(
            &lookup,
            "NEWSHUB_CACHE_TIMEOUT_MS",
            DEFAULT_CACHE_TIMEOUT_MS,
        )?);

        let batch_size = positive(&lookup, "NEWSHUB_BATCH_SIZE", DEFAULT_BATCH_SIZE as u64)?;
        if batch_size > MAX_BATCH_SIZE as u64 {
            return Err(HubError::Config(format!(
                "NEWSHUB_BATCH_SIZE must be at most {}, got {}",
                MAX_BATCH_SIZE, batch_size
            )));
        }

        let retention_days = positive(&lookup, "NEWSHUB_RETENTION_DAYS", DEFAULT_RETENTION_DAYS as u64)?;
        let retention_days = i64::try_from(retention_days).map_err(|_| {
            HubError::Config(format!("NEWSHUB_RETENTION_DAYS is out of range: {}", retention_days))
        })?;

        Ok(Self {
            db_path,
            redis_url,
            fetch_timeout,
            collect_timeout,
            cache_timeout,
            batch_size: batch_size as usize,
            retention_days,
        })
    }
}

fn positive<F>(lookup: &F, key: &str, default: u64) -> HubResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(HubError::Config(format!(
                "{} must be a positive integer, got '{}'",
                key, raw
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> HubResult<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned(), None)
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.db_path, "./newshub.db");
        assert!(config.redis_url.is_none());
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.collect_timeout, Duration::from_secs(300));
        assert_eq!(config.cache_timeout, Duration::from_secs(2));
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.retention_days, 30);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("NEWSHUB_DB_PATH", "/tmp/news.db"),
            ("NEWSHUB_REDIS_URL", "redis://127.0.0.1:6379"),
            ("NEWSHUB_BATCH_SIZE", "25"),
            ("NEWSHUB_COLLECT_TIMEOUT_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(config.db_path, "/tmp/news.db");
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.collect_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_blank_redis_url_means_in_process_cache() {
        let config = config_from(&[("NEWSHUB_REDIS_URL", "  ")]).unwrap();
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let result = config_from(&[("NEWSHUB_BATCH_SIZE", "0")]);
        assert!(matches!(result, Err(HubError::Config(msg)) if msg.contains("NEWSHUB_BATCH_SIZE")));
    }

    #[test]
    fn test_garbage_timeout_rejected() {
        let result = config_from(&[("NEWSHUB_FETCH_TIMEOUT_SECS", "soon")]);
        assert!(matches!(result, Err(HubError::Config(_))));
    }

    #[test]
    fn test_batch_size_bounded_by_bind_limit() {
        let config = config_from(&[("NEWSHUB_BATCH_SIZE", "6553")]).unwrap();
        assert_eq!(config.batch_size, MAX_BATCH_SIZE);

        let result = config_from(&[("NEWSHUB_BATCH_SIZE", "6554")]);
        assert!(matches!(result, Err(HubError::Config(msg)) if msg.contains("at most 6553")));
    }

    #[test]
    fn test_retention_days_beyond_i64_rejected() {
        let result = config_from(&[("NEWSHUB_RETENTION_DAYS", "18446744073709551615")]);
        assert!(matches!(result, Err(HubError::Config(msg)) if msg.contains("NEWSHUB_RETENTION_DAYS")));
    }
}
