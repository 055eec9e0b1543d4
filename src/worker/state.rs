//! Worker lifecycle state machine

use crate::error::{ShellCacheError, ShellCacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a worker instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Uninstalled,
    Installing,
    Installed,
    InstallFailed,
    Activating,
    Active,
}

/// Kind of lifecycle event delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Activate => write!(f, "activate"),
            Self::Fetch => write!(f, "fetch"),
        }
    }
}

impl WorkerState {
    /// State entered when `event` starts in this state
    ///
    /// Fetch handling is stateless and accepted in every state.
    pub fn begin(self, event: EventKind) -> ShellCacheResult<Self> {
        match (self, event) {
            (Self::Uninstalled | Self::InstallFailed | Self::Installed, EventKind::Install) => {
                Ok(Self::Installing)
            }
            (Self::Installed | Self::Active, EventKind::Activate) => Ok(Self::Activating),
            (state, EventKind::Fetch) => Ok(state),
            (state, event) => Err(ShellCacheError::transition(state, event)),
        }
    }

    /// State reached when the in-progress event settles
    ///
    /// Activation always settles as active; delete failures never block it.
    pub fn settle(self, succeeded: bool) -> Self {
        match (self, succeeded) {
            (Self::Installing, true) => Self::Installed,
            (Self::Installing, false) => Self::InstallFailed,
            (Self::Activating, _) => Self::Active,
            (state, _) => state,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninstalled => write!(f, "uninstalled"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::InstallFailed => write!(f, "install failed"),
            Self::Activating => write!(f, "activating"),
            Self::Active => write!(f, "active"),
        }
    }
}
