//! Install and update commands

use super::activate::run_activation;
use super::open_worker;
use crate::audit::{AuditEvent, AuditLog};
use crate::config::Config;
use crate::error::ShellCacheResult;
use crate::ui::{self, AssetProgress, UiContext};
use crate::worker::{CacheManager, InstallReport};

/// Execute the install command
pub async fn execute(config: &Config) -> ShellCacheResult<()> {
    let ctx = UiContext::detect();
    let audit = AuditLog::new(config);
    let (manager, _) = open_worker(config).await?;

    ui::intro(&ctx, "shellcache install");
    let report = run_install(&ctx, &manager, &audit, config.app.manifest.len()).await?;
    ui::outro_success(
        &ctx,
        &format!("Installed {} ({} assets)", report.bucket, report.assets),
    );
    ui::remark(&ctx, "Run `shellcache activate` to remove older buckets");

    Ok(())
}

/// Execute the update command: install, then activate
pub async fn update(config: &Config) -> ShellCacheResult<()> {
    let ctx = UiContext::detect();
    let audit = AuditLog::new(config);
    let (manager, _) = open_worker(config).await?;

    ui::intro(&ctx, "shellcache update");
    run_install(&ctx, &manager, &audit, config.app.manifest.len()).await?;
    let report = run_activation(&ctx, &manager, &audit).await?;

    if report.failed.is_empty() {
        ui::outro_success(&ctx, &format!("{} is active", report.bucket));
    } else {
        ui::outro_warn(
            &ctx,
            &format!(
                "{} is active; {} stale bucket(s) remain",
                report.bucket,
                report.failed.len()
            ),
        );
    }

    Ok(())
}

async fn run_install(
    ctx: &UiContext,
    manager: &CacheManager,
    audit: &AuditLog,
    assets: usize,
) -> ShellCacheResult<InstallReport> {
    let bucket = manager.bucket_name();
    let progress = AssetProgress::new(ctx, &bucket, assets);

    match manager.install().await {
        Ok(report) => {
            progress.finish();
            ui::step_ok_detail(
                ctx,
                &format!("Prefetched {} assets", report.assets),
                &format!("{} bytes", report.bytes),
            );
            audit
                .record(AuditEvent::InstallSucceeded, Some(manager.id()), &report)
                .await;
            Ok(report)
        }
        Err(e) => {
            progress.abandon();
            audit
                .record(
                    AuditEvent::InstallFailed,
                    Some(manager.id()),
                    &serde_json::json!({ "bucket": bucket, "error": e.to_string() }),
                )
                .await;
            Err(e)
        }
    }
}
