//! Cache bucket naming and readiness state
//!
//! Buckets are named `<app-id>-cache-v<version>`. A bucket only becomes
//! servable once it is marked complete.

use crate::config::schema::AppConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the app id and the version in a bucket name
const NAME_INFIX: &str = "-cache-v";

/// A version-qualified bucket name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName {
    /// Application identifier
    pub app_id: String,
    /// Cache version
    pub version: u32,
}

impl BucketName {
    /// Create a bucket name
    pub fn new(app_id: impl Into<String>, version: u32) -> Self {
        Self {
            app_id: app_id.into(),
            version,
        }
    }

    /// Bucket name for the configured application shell
    pub fn from_config(app: &AppConfig) -> Self {
        Self::new(app.id.clone(), app.version)
    }

    /// Parse a bucket name, returning None for names not in the
    /// `<app-id>-cache-v<version>` format
    pub fn parse(name: &str) -> Option<Self> {
        let pos = name.rfind(NAME_INFIX)?;
        let app_id = &name[..pos];
        let version = &name[pos + NAME_INFIX.len()..];

        if app_id.is_empty() || version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        Some(Self::new(app_id, version.parse().ok()?))
    }

    /// Whether this name belongs to the given application
    pub fn is_same_app(&self, other: &BucketName) -> bool {
        self.app_id == other.app_id
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.app_id, NAME_INFIX, self.version)
    }
}

/// Readiness state of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketState {
    /// No bucket exists
    Miss,
    /// Bucket exists but population has not completed
    Building,
    /// Every manifest asset is stored; safe to serve
    Complete,
}

impl BucketState {
    /// Whether fetches may be served from this bucket
    pub fn is_servable(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for BucketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Miss => write!(f, "miss"),
            Self::Building => write!(f, "building"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Metadata about a stored bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Raw bucket name
    pub name: String,
    /// Readiness state
    pub state: BucketState,
    /// When the bucket was created
    pub created_at: DateTime<Utc>,
    /// When the bucket state last changed
    pub updated_at: DateTime<Utc>,
    /// Number of stored entries (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
}

impl BucketInfo {
    /// Create metadata for a freshly opened bucket
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            state: BucketState::Building,
            created_at: now,
            updated_at: now,
            entry_count: None,
        }
    }

    /// Parsed version-qualified name, if the bucket follows the naming format
    pub fn bucket_name(&self) -> Option<BucketName> {
        BucketName::parse(&self.name)
    }

    /// Update the state and bump the modification time
    pub fn set_state(&mut self, state: BucketState) {
        self.state = state;
        self.updated_at = Utc::now();
    }
}

/// Check a raw bucket name is safe to use as a storage key
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}
