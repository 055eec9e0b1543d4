//! Filesystem cache storage
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<bucket>/bucket.json             bucket metadata and state
//! <root>/<bucket>/entries/<sha256>.json   entry key, status, headers
//! <root>/<bucket>/entries/<sha256>.body   raw response body
//! ```
//!
//! An entry exists once its `.json` file exists; the body is written first.

use super::CacheStorage;
use crate::cache::bucket::is_valid_name;
use crate::cache::{BucketInfo, BucketState, CacheKey, Request, Response};
use crate::error::{ShellCacheError, ShellCacheResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const BUCKET_META: &str = "bucket.json";
const ENTRIES_DIR: &str = "entries";

/// Metadata file stored next to a response body
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedEntry {
    key: CacheKey,
    response: Response,
    cached_at: DateTime<Utc>,
}

impl CachedEntry {
    fn new(request: &Request, response: Response) -> Self {
        Self {
            key: request.cache_key(),
            response,
            cached_at: Utc::now(),
        }
    }
}

/// Bucket store rooted at a directory
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Create a store rooted at `root` (created lazily)
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn bucket_dir(&self, name: &str) -> ShellCacheResult<PathBuf> {
        if !is_valid_name(name) {
            return Err(ShellCacheError::InvalidBucketName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    async fn read_meta(&self, name: &str) -> ShellCacheResult<Option<BucketInfo>> {
        let path = self.bucket_dir(name)?.join(BUCKET_META);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ShellCacheError::io(
                format!("reading bucket metadata {}", path.display()),
                e,
            )),
        }
    }

    async fn require_meta(&self, name: &str) -> ShellCacheResult<BucketInfo> {
        self.read_meta(name)
            .await?
            .ok_or_else(|| ShellCacheError::BucketNotFound(name.to_string()))
    }

    async fn write_meta(&self, info: &BucketInfo) -> ShellCacheResult<()> {
        let dir = self.bucket_dir(&info.name)?;
        let mut stored = info.clone();
        stored.entry_count = None;
        write_atomic(&dir.join(BUCKET_META), serde_json::to_vec_pretty(&stored)?).await
    }

    /// Paths of every entry metadata file in a bucket
    async fn entry_files(&self, name: &str) -> ShellCacheResult<Vec<PathBuf>> {
        let dir = self.bucket_dir(name)?.join(ENTRIES_DIR);
        let mut files = Vec::new();

        let mut reader = match fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(files),
            Err(e) => {
                return Err(ShellCacheError::io(
                    format!("listing entries in {}", dir.display()),
                    e,
                ))
            }
        };

        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| ShellCacheError::io(format!("listing entries in {}", dir.display()), e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }

        Ok(files)
    }
}

/// Write a file via a temporary sibling and rename
///
/// Every write gets its own temporary name, so concurrent writers of the
/// same path each rename a complete file and the last rename wins.
async fn write_atomic(path: &Path, contents: Vec<u8>) -> ShellCacheResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)
        .await
        .map_err(|e| ShellCacheError::io(format!("writing {}", tmp.display()), e))?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(ShellCacheError::io(
            format!("renaming into {}", path.display()),
            e,
        ));
    }
    Ok(())
}

async fn remove_if_exists(path: &Path) -> ShellCacheResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ShellCacheError::io(format!("removing {}", path.display()), e)),
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> ShellCacheResult<BucketInfo> {
        if let Some(info) = self.inspect(name).await? {
            return Ok(info);
        }

        let entries = self.bucket_dir(name)?.join(ENTRIES_DIR);
        fs::create_dir_all(&entries).await.map_err(|e| {
            ShellCacheError::io(format!("creating bucket directory {}", entries.display()), e)
        })?;

        let mut info = BucketInfo::new(name);
        self.write_meta(&info).await?;
        debug!("Created bucket {} at {}", name, self.root.display());

        info.entry_count = Some(0);
        Ok(info)
    }

    async fn names(&self) -> ShellCacheResult<Vec<String>> {
        let mut names = Vec::new();

        let mut reader = match fs::read_dir(&self.root).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(names),
            Err(e) => {
                return Err(ShellCacheError::io(
                    format!("listing buckets in {}", self.root.display()),
                    e,
                ))
            }
        };

        while let Some(entry) = reader.next_entry().await.map_err(|e| {
            ShellCacheError::io(format!("listing buckets in {}", self.root.display()), e)
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_valid_name(&name) && entry.path().join(BUCKET_META).exists() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    async fn inspect(&self, name: &str) -> ShellCacheResult<Option<BucketInfo>> {
        let Some(mut info) = self.read_meta(name).await? else {
            return Ok(None);
        };
        info.entry_count = Some(self.entry_files(name).await?.len());
        Ok(Some(info))
    }

    async fn delete(&self, name: &str) -> ShellCacheResult<bool> {
        let dir = self.bucket_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Deleted bucket directory {}", dir.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ShellCacheError::CacheDelete {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn set_state(&self, name: &str, state: BucketState) -> ShellCacheResult<()> {
        let mut info = self.require_meta(name).await?;
        info.set_state(state);
        self.write_meta(&info).await
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: &Response,
    ) -> ShellCacheResult<()> {
        self.require_meta(name).await?;

        let entries = self.bucket_dir(name)?.join(ENTRIES_DIR);
        fs::create_dir_all(&entries).await.map_err(|e| {
            ShellCacheError::io(format!("creating entries directory {}", entries.display()), e)
        })?;

        let entry = CachedEntry::new(request, response.clone());
        let digest = entry.key.digest();

        write_atomic(
            &entries.join(format!("{digest}.body")),
            response.body.clone(),
        )
        .await?;
        write_atomic(
            &entries.join(format!("{digest}.json")),
            serde_json::to_vec_pretty(&entry)?,
        )
        .await?;

        debug!("Stored {} in {}", entry.key, name);
        Ok(())
    }

    async fn lookup(&self, name: &str, request: &Request) -> ShellCacheResult<Option<Response>> {
        self.require_meta(name).await?;

        let key = request.cache_key();
        let digest = key.digest();
        let entries = self.bucket_dir(name)?.join(ENTRIES_DIR);
        let meta_path = entries.join(format!("{digest}.json"));

        let content = match fs::read_to_string(&meta_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShellCacheError::io(
                    format!("reading entry {}", meta_path.display()),
                    e,
                ))
            }
        };

        let entry: CachedEntry = serde_json::from_str(&content)?;
        if entry.key != key {
            warn!("Entry {} does not match key {}, ignoring", digest, key);
            return Ok(None);
        }

        let body_path = entries.join(format!("{digest}.body"));
        let body = fs::read(&body_path)
            .await
            .map_err(|e| ShellCacheError::io(format!("reading body {}", body_path.display()), e))?;

        Ok(Some(Response {
            body,
            ..entry.response
        }))
    }

    async fn remove(&self, name: &str, key: &CacheKey) -> ShellCacheResult<bool> {
        self.require_meta(name).await?;

        let entries = self.bucket_dir(name)?.join(ENTRIES_DIR);
        let digest = key.digest();
        // The entry disappears with its metadata file; the body follows
        let existed = remove_if_exists(&entries.join(format!("{digest}.json"))).await?;
        remove_if_exists(&entries.join(format!("{digest}.body"))).await?;
        Ok(existed)
    }

    async fn keys(&self, name: &str) -> ShellCacheResult<Vec<CacheKey>> {
        self.require_meta(name).await?;

        let mut keys = Vec::new();
        for path in self.entry_files(name).await? {
            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| ShellCacheError::io(format!("reading entry {}", path.display()), e))?;
            let entry: CachedEntry = serde_json::from_str(&content)?;
            keys.push(entry.key);
        }

        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn request(path: &str) -> Request {
        Request::parse(&format!("http://localhost{path}")).unwrap()
    }

    #[tokio::test]
    async fn names_empty_when_root_missing() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().join("missing"));
        assert!(storage.names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_put_lookup() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().to_path_buf());

        let info = storage.open("app-cache-v1").await.unwrap();
        assert_eq!(info.state, BucketState::Building);

        let response = Response::new(200, b"<html></html>".to_vec())
            .with_header("content-type", "text/html");
        storage
            .put("app-cache-v1", &request("/index.html"), &response)
            .await
            .unwrap();

        let found = storage
            .lookup("app-cache-v1", &request("/index.html"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, response);

        assert!(storage
            .lookup("app-cache-v1", &request("/other.html"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn state_and_entries_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let storage = DiskStorage::new(temp.path().to_path_buf());
            storage.open("app-cache-v2").await.unwrap();
            storage
                .put("app-cache-v2", &request("/"), &Response::new(200, "root"))
                .await
                .unwrap();
            storage
                .set_state("app-cache-v2", BucketState::Complete)
                .await
                .unwrap();
        }

        let storage = DiskStorage::new(temp.path().to_path_buf());
        let info = storage.inspect("app-cache-v2").await.unwrap().unwrap();
        assert_eq!(info.state, BucketState::Complete);
        assert_eq!(info.entry_count, Some(1));

        let keys = storage.keys("app-cache-v2").await.unwrap();
        assert_eq!(keys, vec![request("/").cache_key()]);
    }

    #[tokio::test]
    async fn put_same_key_twice_keeps_one_entry() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().to_path_buf());
        storage.open("b").await.unwrap();

        storage
            .put("b", &request("/a"), &Response::new(200, "one"))
            .await
            .unwrap();
        storage
            .put("b", &request("/a"), &Response::new(200, "two"))
            .await
            .unwrap();

        assert_eq!(storage.keys("b").await.unwrap().len(), 1);
        let found = storage.lookup("b", &request("/a")).await.unwrap().unwrap();
        assert_eq!(found.body, b"two");
    }

    #[tokio::test]
    async fn concurrent_puts_from_two_handles_all_succeed() {
        let temp = TempDir::new().unwrap();
        let a = Arc::new(DiskStorage::new(temp.path().to_path_buf()));
        let b = Arc::new(DiskStorage::new(temp.path().to_path_buf()));
        a.open("app-cache-v2").await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..50 {
            for storage in [a.clone(), b.clone()] {
                tasks.push(tokio::spawn(async move {
                    storage
                        .put(
                            "app-cache-v2",
                            &request("/index.html"),
                            &Response::new(200, format!("body {i}")),
                        )
                        .await
                }));
            }
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(a.keys("app-cache-v2").await.unwrap().len(), 1);
        let found = b
            .lookup("app-cache-v2", &request("/index.html"))
            .await
            .unwrap()
            .unwrap();
        assert!(found.body.starts_with(b"body "));

        let leftovers: Vec<_> = std::fs::read_dir(temp.path().join("app-cache-v2/entries"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn repeated_headers_survive_storage() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().to_path_buf());
        storage.open("b").await.unwrap();

        let response = Response::new(200, "ok")
            .with_header("set-cookie", "a=1")
            .with_header("set-cookie", "b=2");
        storage.put("b", &request("/"), &response).await.unwrap();

        let found = storage.lookup("b", &request("/")).await.unwrap().unwrap();
        assert_eq!(found.headers, response.headers);
    }

    #[tokio::test]
    async fn remove_drops_single_entry() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().to_path_buf());
        storage.open("b").await.unwrap();
        storage
            .put("b", &request("/a"), &Response::new(200, "a"))
            .await
            .unwrap();
        storage
            .put("b", &request("/b"), &Response::new(200, "b"))
            .await
            .unwrap();

        assert!(storage.remove("b", &request("/a").cache_key()).await.unwrap());
        assert!(!storage.remove("b", &request("/a").cache_key()).await.unwrap());
        assert!(storage.lookup("b", &request("/a")).await.unwrap().is_none());
        assert_eq!(storage.keys("b").await.unwrap(), vec![request("/b").cache_key()]);
    }

    #[tokio::test]
    async fn delete_removes_bucket() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().to_path_buf());
        storage.open("app-cache-v1").await.unwrap();
        storage.open("app-cache-v2").await.unwrap();

        assert!(storage.delete("app-cache-v1").await.unwrap());
        assert!(!storage.delete("app-cache-v1").await.unwrap());
        assert_eq!(storage.names().await.unwrap(), vec!["app-cache-v2"]);
    }

    #[tokio::test]
    async fn ignores_directories_without_metadata() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("stray")).unwrap();
        let storage = DiskStorage::new(temp.path().to_path_buf());
        storage.open("app-cache-v1").await.unwrap();

        assert_eq!(storage.names().await.unwrap(), vec!["app-cache-v1"]);
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().to_path_buf());
        assert!(matches!(
            storage.open("../outside").await,
            Err(ShellCacheError::InvalidBucketName(_))
        ));
        assert!(matches!(
            storage.delete("a/b").await,
            Err(ShellCacheError::InvalidBucketName(_))
        ));
    }

    #[tokio::test]
    async fn missing_bucket_operations_fail() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().to_path_buf());
        assert!(matches!(
            storage.put("nope", &request("/"), &Response::new(200, "")).await,
            Err(ShellCacheError::BucketNotFound(_))
        ));
        assert!(matches!(
            storage.keys("nope").await,
            Err(ShellCacheError::BucketNotFound(_))
        ));
    }
}
