//! Cache storage backends
//!
//! The bucket namespace is shared by every worker instance on an origin, so
//! it is injected into the manager rather than reached for globally:
//! - `MemoryStorage`: process-local, used in tests and `backend = "memory"`
//! - `DiskStorage`: one directory per bucket under the storage root

mod disk;
mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use crate::cache::{BucketInfo, BucketState, CacheKey, Request, Response};
use crate::config::schema::StorageBackend;
use crate::config::{Config, ConfigManager};
use crate::error::ShellCacheResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Origin-scoped cache storage
///
/// Buckets are addressed by name. `open` creates a bucket if it is absent;
/// every other per-bucket operation fails with `BucketNotFound` when the
/// bucket does not exist.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a bucket, creating it in the `building` state if absent
    async fn open(&self, name: &str) -> ShellCacheResult<BucketInfo>;

    /// Names of every bucket held by this origin
    async fn names(&self) -> ShellCacheResult<Vec<String>>;

    /// Metadata for a bucket, including its entry count
    async fn inspect(&self, name: &str) -> ShellCacheResult<Option<BucketInfo>>;

    /// Delete a bucket and all its entries; returns whether it existed
    async fn delete(&self, name: &str) -> ShellCacheResult<bool>;

    /// Update the readiness state of a bucket
    async fn set_state(&self, name: &str, state: BucketState) -> ShellCacheResult<()>;

    /// Store a response, replacing any entry with the same key
    async fn put(&self, name: &str, request: &Request, response: &Response)
        -> ShellCacheResult<()>;

    /// Find the response stored for a request
    async fn lookup(&self, name: &str, request: &Request) -> ShellCacheResult<Option<Response>>;

    /// Remove a single entry; returns whether it existed
    async fn remove(&self, name: &str, key: &CacheKey) -> ShellCacheResult<bool>;

    /// Keys of every entry in a bucket, sorted
    async fn keys(&self, name: &str) -> ShellCacheResult<Vec<CacheKey>>;

    /// Get the human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Create the storage backend selected by the configuration
pub fn create_storage(config: &Config) -> Arc<dyn CacheStorage> {
    match config.storage.backend {
        StorageBackend::Disk => Arc::new(DiskStorage::new(ConfigManager::storage_dir(config))),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_storage_memory() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        assert_eq!(create_storage(&config).backend_name(), "memory");
    }

    #[test]
    fn create_storage_disk() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.path = Some(temp.path().to_path_buf());
        assert_eq!(create_storage(&config).backend_name(), "disk");
    }
}
