//! Audit trail of cache lifecycle events
//!
//! Appends JSON lines to `<state_dir>/audit.log`, one per install, activation
//! or manual bucket removal. Disable with `general.audit_log = false`.

use crate::config::{schema::Config, ConfigManager};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// Lifecycle events recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    InstallSucceeded,
    InstallFailed,
    Activated,
    BucketsCleared,
}

impl AuditEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstallSucceeded => "worker.installed",
            Self::InstallFailed => "worker.install_failed",
            Self::Activated => "worker.activated",
            Self::BucketsCleared => "bucket.cleared",
        }
    }
}

/// File-based audit logger that appends JSON lines
pub struct AuditLog {
    enabled: bool,
    path: PathBuf,
}

impl AuditLog {
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.audit_log,
            path: ConfigManager::audit_log_path(),
        }
    }

    /// Record an event, attributed to a worker instance when one ran it
    ///
    /// IO and serialization failures are logged and dropped; auditing never
    /// fails the command that triggered it.
    pub async fn record<T: Serialize>(&self, event: AuditEvent, worker: Option<Uuid>, data: &T) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event.as_str(),
            "worker": worker,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize audit event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
