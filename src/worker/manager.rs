//! Offline asset cache manager
//!
//! Drives the install/activate/fetch lifecycle against an injected storage
//! namespace and network. Every operation returns a future the host must
//! await; the worker instance is not torn down until it settles.

use crate::cache::{BucketName, BucketState, CacheKey, Request, Response};
use crate::config::schema::AppConfig;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::network::Fetcher;
use crate::storage::CacheStorage;
use crate::worker::state::{EventKind, WorkerState};
use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// A lifecycle event delivered by the host
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(Request),
}

impl LifecycleEvent {
    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Install => EventKind::Install,
            Self::Activate => EventKind::Activate,
            Self::Fetch(_) => EventKind::Fetch,
        }
    }
}

/// Result of handling a lifecycle event
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivationReport),
    Responded(FetchResponse),
}

/// Summary of a successful install
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub bucket: String,
    pub assets: usize,
    pub bytes: usize,
}

/// Summary of an activation sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivationReport {
    pub bucket: String,
    /// Stale buckets removed
    pub deleted: Vec<String>,
    /// Stale buckets that could not be removed, with the reason
    pub failed: Vec<(String, String)>,
}

/// Where a fetch response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Response to a fetch event
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub response: Response,
    pub source: ResponseSource,
}

/// Whether a manifest asset is present in the current bucket
#[derive(Debug, Clone, Serialize)]
pub struct AssetStatus {
    pub path: String,
    pub url: String,
    pub cached: bool,
}

/// Cache manager for one worker instance
pub struct CacheManager {
    id: Uuid,
    bucket: BucketName,
    manifest: Vec<(String, Request)>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state: Mutex<WorkerState>,
}

impl CacheManager {
    /// Create a manager for the configured application shell
    ///
    /// Manifest paths are resolved against the origin up front, so a bad
    /// origin or path is reported before any lifecycle event runs.
    pub fn new(
        app: &AppConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> ShellCacheResult<Self> {
        let origin = Url::parse(&app.origin).map_err(|e| ShellCacheError::InvalidUrl {
            url: app.origin.clone(),
            reason: e.to_string(),
        })?;

        let manifest = app
            .manifest
            .iter()
            .map(|path| Ok((path.clone(), Request::for_path(&origin, path)?)))
            .collect::<ShellCacheResult<Vec<_>>>()?;

        // Two paths resolving to one key would be stored once but fetched twice
        let mut seen = HashSet::new();
        if let Some((_, request)) = manifest
            .iter()
            .find(|(_, request)| !seen.insert(request.cache_key()))
        {
            return Err(ShellCacheError::DuplicateAsset {
                url: request.url.to_string(),
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            bucket: BucketName::from_config(app),
            manifest,
            storage,
            fetcher,
            state: Mutex::new(WorkerState::Uninstalled),
        })
    }

    /// Pick up where a previous worker instance left off
    ///
    /// A complete current bucket means install already succeeded, so the
    /// manager starts out installed and can be activated directly.
    pub async fn restore(self) -> ShellCacheResult<Self> {
        if let Some(info) = self.storage.inspect(&self.bucket_name()).await? {
            if info.state.is_servable() {
                *self.state.lock().await = WorkerState::Installed;
                debug!(worker = %self.id, bucket = %info.name, "Restored installed worker");
            }
        }
        Ok(self)
    }

    /// Unique id of this worker instance
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the current bucket
    pub fn bucket_name(&self) -> String {
        self.bucket.to_string()
    }

    /// Current lifecycle state
    pub async fn state(&self) -> WorkerState {
        *self.state.lock().await
    }

    /// Dispatch a lifecycle event
    pub async fn handle(&self, event: LifecycleEvent) -> ShellCacheResult<EventOutcome> {
        debug!(worker = %self.id, event = %event.kind(), "Handling lifecycle event");
        match event {
            LifecycleEvent::Install => self.install().await.map(EventOutcome::Installed),
            LifecycleEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            LifecycleEvent::Fetch(request) => self
                .respond_to_fetch(&request)
                .await
                .map(EventOutcome::Responded),
        }
    }

    /// Populate the current bucket with every manifest asset
    ///
    /// All-or-nothing: if any asset cannot be fetched with a 2xx status the
    /// install fails, nothing is written, and the worker is left in
    /// `InstallFailed` for the host to retry.
    pub async fn install(&self) -> ShellCacheResult<InstallReport> {
        self.begin(EventKind::Install).await?;

        let result = self.populate().await;
        let state = self.settle(result.is_ok()).await;

        match &result {
            Ok(report) => info!(
                worker = %self.id,
                bucket = %report.bucket,
                assets = report.assets,
                "Install complete"
            ),
            Err(e) => warn!(worker = %self.id, %state, "Install failed: {}", e),
        }

        result
    }

    async fn populate(&self) -> ShellCacheResult<InstallReport> {
        let name = self.bucket_name();
        let opened = self.storage.open(&name).await?;

        let fetches = self
            .manifest
            .iter()
            .map(|(_, request)| self.fetch_manifest_asset(request));
        let fetched = try_join_all(fetches).await?;

        // Nothing is written until every asset is in hand
        if opened.state.is_servable() {
            self.refresh_in_place(&name, &fetched).await?;
        } else {
            self.rebuild(&name, &fetched).await?;
        }

        Ok(InstallReport {
            bucket: name,
            assets: fetched.len(),
            bytes: fetched.iter().map(|(_, r)| r.body.len()).sum(),
        })
    }

    /// Populate a bucket that is not yet servable
    ///
    /// Leftover entries from an interrupted install that the manifest no
    /// longer lists are dropped by recreating the bucket.
    async fn rebuild(&self, name: &str, fetched: &[(&Request, Response)]) -> ShellCacheResult<()> {
        if !self.unlisted_keys(name).await?.is_empty() {
            debug!(worker = %self.id, bucket = %name, "Recreating bucket");
            self.storage.delete(name).await?;
            self.storage.open(name).await?;
        }

        self.storage.set_state(name, BucketState::Building).await?;
        for (request, response) in fetched {
            self.storage.put(name, request, response).await?;
        }
        self.storage.set_state(name, BucketState::Complete).await
    }

    /// Re-populate a bucket that is already complete without taking it
    /// out of service
    ///
    /// Each put replaces one entry, so every lookup during or after a failed
    /// refresh still finds a stored response for its key. Unlisted entries
    /// are removed only once every put has landed.
    async fn refresh_in_place(
        &self,
        name: &str,
        fetched: &[(&Request, Response)],
    ) -> ShellCacheResult<()> {
        debug!(worker = %self.id, bucket = %name, "Refreshing complete bucket in place");
        for (request, response) in fetched {
            self.storage.put(name, request, response).await?;
        }
        for key in self.unlisted_keys(name).await? {
            self.storage.remove(name, &key).await?;
        }
        Ok(())
    }

    /// Keys stored in a bucket that the manifest does not list
    async fn unlisted_keys(&self, name: &str) -> ShellCacheResult<Vec<CacheKey>> {
        let listed: HashSet<_> = self.manifest.iter().map(|(_, r)| r.cache_key()).collect();
        Ok(self
            .storage
            .keys(name)
            .await?
            .into_iter()
            .filter(|key| !listed.contains(key))
            .collect())
    }

    async fn fetch_manifest_asset<'a>(
        &self,
        request: &'a Request,
    ) -> ShellCacheResult<(&'a Request, Response)> {
        let url = request.url.to_string();

        let response = self.fetcher.fetch(request).await.map_err(|e| {
            let reason = match e {
                ShellCacheError::Network { reason, .. } => reason,
                other => other.to_string(),
            };
            ShellCacheError::ManifestFetch {
                url: url.clone(),
                reason,
            }
        })?;

        if !response.is_ok() {
            return Err(ShellCacheError::ManifestFetch {
                url,
                reason: format!("HTTP status {}", response.status),
            });
        }

        debug!(worker = %self.id, %url, bytes = response.body.len(), "Fetched manifest asset");
        Ok((request, response))
    }

    /// Delete every bucket except the current one
    ///
    /// Deletions run concurrently and independently. Failures are logged and
    /// reported but never fail activation.
    pub async fn activate(&self) -> ShellCacheResult<ActivationReport> {
        self.begin(EventKind::Activate).await?;

        let report = self.sweep().await;
        self.settle(true).await;

        info!(
            worker = %self.id,
            bucket = %report.bucket,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Activation complete"
        );
        Ok(report)
    }

    async fn sweep(&self) -> ActivationReport {
        let current = self.bucket_name();
        let mut report = ActivationReport {
            bucket: current.clone(),
            ..Default::default()
        };

        let names = match self.storage.names().await {
            Ok(names) => names,
            Err(e) => {
                warn!(worker = %self.id, "Could not enumerate buckets, skipping sweep: {}", e);
                return report;
            }
        };

        let stale: Vec<String> = names.into_iter().filter(|name| *name != current).collect();
        let results = join_all(stale.iter().map(|name| async move {
            (name.clone(), self.storage.delete(name).await)
        }))
        .await;

        for (name, result) in results {
            match result {
                Ok(_) => {
                    debug!(worker = %self.id, bucket = %name, "Deleted stale bucket");
                    report.deleted.push(name);
                }
                Err(e) => {
                    warn!(worker = %self.id, bucket = %name, "Failed to delete stale bucket: {}", e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        report
    }

    /// Serve a request from the current bucket, falling back to the network
    ///
    /// Cache-first with no freshness check. A miss is forwarded to the
    /// network and its response or error is returned unmodified; network
    /// responses are never written back to the bucket.
    pub async fn respond_to_fetch(&self, request: &Request) -> ShellCacheResult<FetchResponse> {
        if let Some(response) = self.lookup_current(request).await {
            debug!(worker = %self.id, url = %request.url, "Served from cache");
            return Ok(FetchResponse {
                response,
                source: ResponseSource::Cache,
            });
        }

        let response = self.fetcher.fetch(request).await?;
        debug!(worker = %self.id, url = %request.url, status = response.status, "Served from network");
        Ok(FetchResponse {
            response,
            source: ResponseSource::Network,
        })
    }

    /// Look up a request in the current bucket, failing open on storage errors
    async fn lookup_current(&self, request: &Request) -> Option<Response> {
        let name = self.bucket_name();

        match self.storage.inspect(&name).await {
            Ok(Some(info)) if info.state.is_servable() => {}
            Ok(_) => return None,
            Err(e) => {
                warn!(worker = %self.id, bucket = %name, "Cache unavailable, using network: {}", e);
                return None;
            }
        }

        match self.storage.lookup(&name, request).await {
            Ok(found) => found,
            Err(e) => {
                warn!(worker = %self.id, bucket = %name, "Cache lookup failed, using network: {}", e);
                None
            }
        }
    }

    /// Which manifest assets are present in the current bucket
    pub async fn manifest_status(&self) -> ShellCacheResult<Vec<AssetStatus>> {
        let name = self.bucket_name();
        let keys = match self.storage.inspect(&name).await? {
            Some(_) => self.storage.keys(&name).await?,
            None => Vec::new(),
        };

        Ok(self
            .manifest
            .iter()
            .map(|(path, request)| AssetStatus {
                path: path.clone(),
                url: request.url.to_string(),
                cached: keys.contains(&request.cache_key()),
            })
            .collect())
    }

    async fn begin(&self, event: EventKind) -> ShellCacheResult<()> {
        let mut state = self.state.lock().await;
        let next = state.begin(event)?;
        debug!(worker = %self.id, from = %*state, to = %next, "Lifecycle transition");
        *state = next;
        Ok(())
    }

    async fn settle(&self, succeeded: bool) -> WorkerState {
        let mut state = self.state.lock().await;
        let next = state.settle(succeeded);
        debug!(worker = %self.id, from = %*state, to = %next, "Lifecycle transition");
        *state = next;
        next
    }
}
