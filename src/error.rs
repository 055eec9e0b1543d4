//! Error types for shellcache
//!
//! All modules use `ShellCacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shellcache operations
pub type ShellCacheResult<T> = Result<T, ShellCacheError>;

/// All errors that can occur in shellcache
#[derive(Error, Debug)]
pub enum ShellCacheError {
    // Lifecycle errors
    #[error("Failed to fetch manifest asset {url}: {reason}")]
    ManifestFetch { url: String, reason: String },

    #[error("Failed to delete cache bucket {name}: {reason}")]
    CacheDelete { name: String, reason: String },

    #[error("Network request failed for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Cannot handle {event} while worker is {state}")]
    InvalidTransition { state: String, event: String },

    #[error("Cache bucket {0} is not installed")]
    NotInstalled(String),

    #[error("Manifest lists {url} more than once")]
    DuplicateAsset { url: String },

    // Storage errors
    #[error("Cache storage error: {0}")]
    Storage(String),

    #[error("Cache bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Invalid cache bucket name: {0}")]
    InvalidBucketName(String),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ShellCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a request URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid transition error
    pub fn transition(state: impl ToString, event: impl ToString) -> Self {
        Self::InvalidTransition {
            state: state.to_string(),
            event: event.to_string(),
        }
    }

    /// Check if error is retryable
    ///
    /// A failed install is retried by the host on its next load; a failed
    /// passthrough may succeed once connectivity returns.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ManifestFetch { .. } | Self::Network { .. } | Self::CacheDelete { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestFetch { .. } => {
                Some("Check that the app origin is reachable, then run: shellcache install")
            }
            Self::NotInstalled(_) => Some("Run: shellcache install"),
            Self::DuplicateAsset { .. } => Some("Remove the repeated path from app.manifest"),
            Self::ConfigNotFound(_) => Some("Run: shellcache config init"),
            Self::InvalidTransition { .. } => Some("Run: shellcache status"),
            _ => None,
        }
    }
}
