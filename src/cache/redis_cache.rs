use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use tracing::{debug, info};

use crate::cache::traits::{CacheResult, CacheStore};
use crate::errors::CacheError;

const SCAN_COUNT: usize = 100;

/// Redis-backed cache. `ConnectionManager` reconnects on its own, so a
/// clone per call is all the pooling needed here.
#[derive(Clone)]
pub struct RedisCache {
    conn_manager: ConnectionManager,
    redis_url: String,
    op_timeout: Duration,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("redis_url", &self.redis_url)
            .field("conn_manager", &"<ConnectionManager>")
            .field("op_timeout", &self.op_timeout)
            .finish()
    }
}

impl RedisCache {
    /// Every command, the initial connect included, gives up after
    /// `op_timeout` with `CacheError::Unavailable`.
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> CacheResult<Self> {
        info!(url = redis_url, timeout = ?op_timeout, "connecting to redis");
        let client = redis::Client::open(redis_url)?;
        let conn_manager = bounded("connect", op_timeout, ConnectionManager::new(client)).await?;

        Ok(Self {
            conn_manager,
            redis_url: redis_url.to_string(),
            op_timeout,
        })
    }

    async fn scan_delete(&self, pattern: &str) -> RedisResult<u64> {
        let mut conn = self.conn_manager.clone();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await?;
                removed += deleted;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(removed)
    }
}

async fn bounded<T, F>(op: &str, limit: Duration, fut: F) -> CacheResult<T>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(CacheError::Unavailable(format!(
            "redis {} timed out after {:?}",
            op, limit
        ))),
    }
}

/// Escapes glob metacharacters so the prefix matches literally in `SCAN MATCH`.
fn glob_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn_manager.clone();
        bounded("GET", self.op_timeout, conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn_manager.clone();
        bounded("SET", self.op_timeout, conn.set::<_, _, ()>(key, value)).await
    }

    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let pattern = glob_prefix(prefix);
        // the whole scan shares one budget
        let removed = bounded("SCAN/DEL", self.op_timeout, self.scan_delete(&pattern)).await?;

        debug!(pattern = %pattern, removed, "redis prefix delete");
        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
