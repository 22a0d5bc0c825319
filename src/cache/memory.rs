use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::traits::{CacheResult, CacheStore};

/// In-process cache, used when no Redis URL is configured.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut entries = self.entries.write().await;
        let doomed: Vec<String> = entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &doomed {
            entries.remove(key);
        }
        Ok(doomed.len() as u64)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("news:a").await.unwrap(), None);

        cache.set("news:a", "[]").await.unwrap();
        assert_eq!(cache.get("news:a").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_delete_by_prefix_only_touches_namespace() {
        let cache = MemoryCache::new();
        cache.set("news:1", "a").await.unwrap();
        cache.set("news:2", "b").await.unwrap();
        cache.set("newsroom", "c").await.unwrap();
        cache.set("tags:all", "d").await.unwrap();

        let removed = cache.delete_by_prefix("news:").await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(cache.len().await, 2);
        assert!(cache.get("news:1").await.unwrap().is_none());
        assert!(cache.get("newsroom").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_by_prefix_empty_cache() {
        let cache = MemoryCache::new();
        assert_eq!(cache.delete_by_prefix("news:").await.unwrap(), 0);
        assert!(cache.is_empty().await);
    }
}
