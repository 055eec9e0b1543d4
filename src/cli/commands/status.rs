//! Status command - current bucket health and manifest coverage

use super::open_worker;
use crate::cache::{BucketName, BucketState};
use crate::config::schema::StorageBackend;
use crate::config::{Config, ConfigManager};
use crate::error::ShellCacheResult;
use crate::ui::{self, UiContext};

/// Execute the status command
pub async fn execute(config: &Config) -> ShellCacheResult<()> {
    let ctx = UiContext::detect();
    let (manager, storage) = open_worker(config).await?;
    let current = BucketName::from_config(&config.app);

    ui::intro(&ctx, "shellcache status");
    ui::key_value(&ctx, "App", &config.app.id);
    ui::key_value(&ctx, "Origin", &config.app.origin);
    ui::key_value(&ctx, "Backend", storage.backend_name());
    if config.storage.backend == StorageBackend::Disk {
        ui::key_value(
            &ctx,
            "Storage",
            &ConfigManager::storage_dir(config).display().to_string(),
        );
    }

    ui::section(&ctx, "Current bucket");
    let state = storage
        .inspect(&manager.bucket_name())
        .await?
        .map(|info| info.state)
        .unwrap_or(BucketState::Miss);
    ui::key_value(&ctx, "Name", &manager.bucket_name());
    ui::key_value_status(&ctx, "State", &state.to_string(), state.is_servable());
    ui::key_value(&ctx, "Worker", &manager.state().await.to_string());

    ui::section(&ctx, "Manifest");
    let assets = manager.manifest_status().await?;
    let cached = assets.iter().filter(|a| a.cached).count();
    for asset in &assets {
        if asset.cached {
            ui::step_ok(&ctx, &asset.path);
        } else {
            ui::step_warn(&ctx, &format!("{} (not cached)", asset.path));
        }
    }

    let names = storage.names().await?;
    let stale: Vec<&String> = names
        .iter()
        .filter(|name| **name != manager.bucket_name())
        .collect();
    let foreign = stale
        .iter()
        .filter(|name| !BucketName::parse(name).is_some_and(|b| b.is_same_app(&current)))
        .count();

    ui::section(&ctx, "Other buckets");
    if stale.is_empty() {
        ui::step_ok(&ctx, "None");
    } else {
        ui::step_warn_hint(
            &ctx,
            &format!(
                "{} bucket(s) awaiting sweep ({} from other apps)",
                stale.len(),
                foreign
            ),
            "Run: shellcache activate",
        );
    }

    if state.is_servable() && cached == assets.len() {
        ui::outro_success(&ctx, "Application shell is available offline");
    } else {
        ui::outro_warn(&ctx, "Application shell is not installed - Run: shellcache install");
    }

    Ok(())
}
