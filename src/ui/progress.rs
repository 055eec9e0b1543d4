//! Spinners and progress bars with plain fallbacks

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}

/// Progress bar over the manifest assets of an install
///
/// Assets are fetched concurrently, so the bar tracks the bucket's entry
/// count rather than individual requests.
pub struct AssetProgress {
    bar: Option<ProgressBar>,
}

impl AssetProgress {
    pub fn new(ctx: &UiContext, bucket: &str, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total as u64);
            let template = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} {prefix}  {bar:20.cyan/dim} {pos}/{len} {elapsed:.dim}");
            // Fall back to the default style if the template is rejected
            if let Ok(template) = template {
                bar.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ").progress_chars("━╸─"));
            }
            bar.set_prefix(bucket.to_string());
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Prefetching {} asset(s) into {}...", total, bucket);
            None
        };
        Self { bar }
    }

    /// Mark every asset as stored and clear the bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            if let Some(len) = bar.length() {
                bar.set_position(len);
            }
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }

    /// Clear the bar without completing it
    pub fn abandon(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.abandon();
        }
    }
}
