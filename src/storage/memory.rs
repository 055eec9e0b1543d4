//! In-memory cache storage

use super::CacheStorage;
use crate::cache::bucket::is_valid_name;
use crate::cache::{BucketInfo, BucketState, CacheKey, Request, Response};
use crate::error::{ShellCacheError, ShellCacheResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

struct MemoryBucket {
    info: BucketInfo,
    entries: BTreeMap<CacheKey, Response>,
}

/// Process-local bucket store
#[derive(Default)]
pub struct MemoryStorage {
    buckets: RwLock<HashMap<String, MemoryBucket>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> ShellCacheResult<BucketInfo> {
        if !is_valid_name(name) {
            return Err(ShellCacheError::InvalidBucketName(name.to_string()));
        }

        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .entry(name.to_string())
            .or_insert_with(|| MemoryBucket {
                info: BucketInfo::new(name),
                entries: BTreeMap::new(),
            });

        let mut info = bucket.info.clone();
        info.entry_count = Some(bucket.entries.len());
        Ok(info)
    }

    async fn names(&self) -> ShellCacheResult<Vec<String>> {
        let mut names: Vec<String> = self.buckets.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn inspect(&self, name: &str) -> ShellCacheResult<Option<BucketInfo>> {
        Ok(self.buckets.read().await.get(name).map(|bucket| {
            let mut info = bucket.info.clone();
            info.entry_count = Some(bucket.entries.len());
            info
        }))
    }

    async fn delete(&self, name: &str) -> ShellCacheResult<bool> {
        Ok(self.buckets.write().await.remove(name).is_some())
    }

    async fn set_state(&self, name: &str, state: BucketState) -> ShellCacheResult<()> {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .get_mut(name)
            .ok_or_else(|| ShellCacheError::BucketNotFound(name.to_string()))?;
        bucket.info.set_state(state);
        Ok(())
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: &Response,
    ) -> ShellCacheResult<()> {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .get_mut(name)
            .ok_or_else(|| ShellCacheError::BucketNotFound(name.to_string()))?;
        bucket.entries.insert(request.cache_key(), response.clone());
        Ok(())
    }

    async fn lookup(&self, name: &str, request: &Request) -> ShellCacheResult<Option<Response>> {
        let buckets = self.buckets.read().await;
        let bucket = buckets
            .get(name)
            .ok_or_else(|| ShellCacheError::BucketNotFound(name.to_string()))?;
        Ok(bucket.entries.get(&request.cache_key()).cloned())
    }

    async fn remove(&self, name: &str, key: &CacheKey) -> ShellCacheResult<bool> {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .get_mut(name)
            .ok_or_else(|| ShellCacheError::BucketNotFound(name.to_string()))?;
        Ok(bucket.entries.remove(key).is_some())
    }

    async fn keys(&self, name: &str) -> ShellCacheResult<Vec<CacheKey>> {
        let buckets = self.buckets.read().await;
        let bucket = buckets
            .get(name)
            .ok_or_else(|| ShellCacheError::BucketNotFound(name.to_string()))?;
        Ok(bucket.entries.keys().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
