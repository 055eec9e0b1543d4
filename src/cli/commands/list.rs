//! List command - show every cache bucket on the origin

use crate::cache::{BucketInfo, BucketName, BucketState};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::ShellCacheResult;
use crate::storage::create_storage;
use console::style;
use serde::Serialize;

/// A bucket as shown by `list`
#[derive(Debug, Serialize)]
struct BucketRow {
    name: String,
    version: Option<u32>,
    state: BucketState,
    entries: usize,
    current: bool,
    updated_at: String,
}

impl BucketRow {
    fn new(info: BucketInfo, current: &str) -> Self {
        Self {
            version: info.bucket_name().map(|b| b.version),
            current: info.name == current,
            entries: info.entry_count.unwrap_or(0),
            state: info.state,
            updated_at: info.updated_at.to_rfc3339(),
            name: info.name,
        }
    }
}

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config) -> ShellCacheResult<()> {
    let storage = create_storage(config);
    let current = BucketName::from_config(&config.app).to_string();

    let mut rows = Vec::new();
    for name in storage.names().await? {
        if let Some(info) = storage.inspect(&name).await? {
            rows.push(BucketRow::new(info, &current));
        }
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => rows.iter().for_each(|row| println!("{}", row.name)),
        OutputFormat::Table if rows.is_empty() => println!("No cache buckets found."),
        OutputFormat::Table => print_table(&rows),
    }

    Ok(())
}

fn print_table(rows: &[BucketRow]) {
    println!(
        "{:<32} {:<8} {:<10} {:<8} {:<20}",
        "BUCKET", "VERSION", "STATE", "ENTRIES", "UPDATED"
    );
    println!("{}", "-".repeat(80));

    for row in rows {
        let state = match row.state {
            BucketState::Complete => style("complete").green().to_string(),
            BucketState::Building => style("building").yellow().to_string(),
            BucketState::Miss => style("miss").dim().to_string(),
        };
        let version = row
            .version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if row.current { " *" } else { "" };
        let updated = row.updated_at.get(..16).unwrap_or(&row.updated_at).replace('T', " ");

        println!(
            "{:<32} {:<8} {:<10} {:<8} {:<20}{}",
            row.name, version, state, row.entries, updated, marker
        );
    }

    println!();
    println!("Total: {} bucket(s), * = current", rows.len());
}
