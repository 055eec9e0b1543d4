//! Configuration schema for shellcache
//!
//! Configuration is stored at `~/.config/shellcache/config.toml`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Application shell settings
    pub app: AppConfig,

    /// Cache storage settings
    pub storage: StorageConfig,

    /// Network client settings
    pub network: NetworkConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record lifecycle events to the audit log
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Application shell settings
///
/// The bucket name is derived as `<id>-cache-v<version>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application identifier used as the bucket name prefix
    pub id: String,

    /// Cache version; bump it to ship a new snapshot of the shell
    pub version: u32,

    /// Origin the manifest paths are resolved against
    pub origin: String,

    /// Asset paths that must be available offline
    pub manifest: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            id: "shekhawats".to_string(),
            version: 2,
            origin: "http://localhost:5173".to_string(),
            manifest: vec![
                "/shekhawats-pwa/".to_string(),
                "/shekhawats-pwa/index.html".to_string(),
                "/shekhawats-pwa/manifest.json".to_string(),
                "/shekhawats-pwa/images/icon-192x192.png".to_string(),
                "/shekhawats-pwa/images/icon-512x512.png".to_string(),
            ],
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Buckets persisted under the storage path
    #[default]
    Disk,
    /// Buckets held in process memory
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disk => write!(f, "disk"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Cache storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend to use
    pub backend: StorageBackend,

    /// Root directory for the disk backend (default: data dir)
    pub path: Option<PathBuf>,
}

/// Network client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Overall timeout for a single request in seconds (0 = none)
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("shellcache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
