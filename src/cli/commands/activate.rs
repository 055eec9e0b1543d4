//! Activate command - sweep buckets left by older versions

use super::open_worker;
use crate::audit::{AuditEvent, AuditLog};
use crate::config::Config;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::ui::{self, TaskSpinner, UiContext};
use crate::worker::{ActivationReport, CacheManager, WorkerState};

/// Execute the activate command
pub async fn execute(config: &Config) -> ShellCacheResult<()> {
    let ctx = UiContext::detect();
    let audit = AuditLog::new(config);
    let (manager, _) = open_worker(config).await?;

    if !matches!(manager.state().await, WorkerState::Installed) {
        return Err(ShellCacheError::NotInstalled(manager.bucket_name()));
    }

    ui::intro(&ctx, "shellcache activate");
    let report = run_activation(&ctx, &manager, &audit).await?;

    if report.failed.is_empty() {
        ui::outro_success(&ctx, &format!("{} is active", report.bucket));
    } else {
        ui::outro_warn(
            &ctx,
            &format!("{} is active with warnings", report.bucket),
        );
    }

    Ok(())
}

pub(super) async fn run_activation(
    ctx: &UiContext,
    manager: &CacheManager,
    audit: &AuditLog,
) -> ShellCacheResult<ActivationReport> {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Sweeping stale buckets...");
    let report = match manager.activate().await {
        Ok(report) => report,
        Err(e) => {
            spinner.stop_error("Activation rejected");
            return Err(e);
        }
    };

    if report.deleted.is_empty() && report.failed.is_empty() {
        spinner.stop("No stale buckets");
    } else {
        spinner.stop(&format!("Swept {} stale bucket(s)", report.deleted.len()));
    }
    for name in &report.deleted {
        ui::step_ok_detail(ctx, "Deleted stale bucket", name);
    }
    for (name, reason) in &report.failed {
        ui::step_warn_hint(
            ctx,
            &format!("Could not delete {}: {}", name, reason),
            "it will be retried on the next activation",
        );
    }

    audit
        .record(AuditEvent::Activated, Some(manager.id()), &report)
        .await;
    Ok(report)
}
