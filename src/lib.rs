//! shellcache - Offline cache for progressive web app shells
//!
//! Keeps an application's shell assets available offline the way a service
//! worker does: prefetch a fixed manifest into a versioned cache bucket on
//! install, answer requests cache-first, and sweep buckets left by older
//! versions on activation.

pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod network;
pub mod storage;
pub mod ui;
pub mod worker;

pub use error::{ShellCacheError, ShellCacheResult};
