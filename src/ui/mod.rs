//! Terminal output for shellcache commands
//!
//! Interactive terminals get `cliclack` styling and spinners; pipes and CI
//! get plain bracketed status lines.
//!
//! ```rust,ignore
//! use shellcache::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Prefetching 5 assets...");
//! spinner.stop("Installed app-cache-v2");
//! ui::step_warn_hint(&ctx, "1 bucket could not be deleted", "Run: shellcache clear");
//! ```

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, outro_warn, remark, section,
    step_error_detail, step_ok, step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{AssetProgress, TaskSpinner};
pub use prompts::confirm;
