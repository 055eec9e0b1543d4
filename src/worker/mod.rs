//! Service worker lifecycle
//!
//! A worker instance moves through install and activation exactly once,
//! answering fetch events throughout:
//!
//! ```text
//! Uninstalled --install--> Installing --ok--> Installed --activate--> Activating --> Active
//!                               |
//!                               +--error--> InstallFailed --install--> Installing
//! ```

mod manager;
mod state;

pub use manager::{
    ActivationReport, AssetStatus, CacheManager, EventOutcome, FetchResponse, InstallReport,
    LifecycleEvent, ResponseSource,
};
pub use state::{EventKind, WorkerState};
