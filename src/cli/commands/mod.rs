//! CLI command implementations

pub mod activate;
pub mod clear;
pub mod config;
pub mod fetch;
pub mod install;
pub mod list;
pub mod status;

pub use activate::execute as activate;
pub use clear::execute as clear;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use install::update;
pub use list::execute as list;
pub use status::execute as status;

use crate::config::Config;
use crate::error::ShellCacheResult;
use crate::network::HttpFetcher;
use crate::storage::{create_storage, CacheStorage};
use crate::worker::CacheManager;
use std::sync::Arc;

/// Build a worker for the configured app, resuming from whatever the
/// storage root already holds
async fn open_worker(config: &Config) -> ShellCacheResult<(CacheManager, Arc<dyn CacheStorage>)> {
    let storage = create_storage(config);
    let fetcher = Arc::new(HttpFetcher::new(&config.network));
    let manager = CacheManager::new(&config.app, storage.clone(), fetcher)?
        .restore()
        .await?;
    Ok((manager, storage))
}
