//! Versioned application-shell cache model
//!
//! Buckets are addressed by `<app-id>-cache-v<version>`. Bumping the version
//! produces a brand-new bucket; the previous one is left untouched until the
//! next activation sweeps it.
//!
//! # Bucket States
//!
//! | State | Served | Description |
//! |-------|--------|-------------|
//! | Miss | no | No bucket exists, install will create it |
//! | Building | no | Opened or interrupted mid-population, install retries it |
//! | Complete | yes | Every manifest asset stored |

pub mod bucket;
pub mod entry;

pub use bucket::{BucketInfo, BucketName, BucketState};
pub use entry::{CacheKey, Method, Request, Response};
