//! Clear command - delete every cache bucket

use crate::audit::{AuditEvent, AuditLog};
use crate::cli::args::ClearArgs;
use crate::config::Config;
use crate::error::ShellCacheResult;
use crate::storage::create_storage;
use crate::ui::{self, UiContext};
use tracing::debug;

/// Execute the clear command
pub async fn execute(args: ClearArgs, config: &Config) -> ShellCacheResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let storage = create_storage(config);
    let names = storage.names().await?;

    if names.is_empty() {
        println!("No cache buckets to clear.");
        return Ok(());
    }

    println!("This will remove {} cache bucket(s):", names.len());
    for name in &names {
        println!("  - {}", name);
    }
    println!();

    if !ui::confirm(&ctx, "Delete these buckets?", false).await? {
        println!("Aborted.");
        return Ok(());
    }

    let mut removed = Vec::new();
    for name in names {
        debug!("Deleting bucket: {}", name);
        match storage.delete(&name).await {
            Ok(_) => removed.push(name),
            Err(e) => ui::step_error_detail(&ctx, &format!("Failed to delete {}", name), &e.to_string()),
        }
    }

    AuditLog::new(config)
        .record(
            AuditEvent::BucketsCleared,
            None,
            &serde_json::json!({ "buckets": removed }),
        )
        .await;
    ui::step_ok(&ctx, &format!("Cleared {} bucket(s)", removed.len()));

    Ok(())
}
