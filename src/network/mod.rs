//! Network access for the cache manager
//!
//! The manager only ever talks to the network through `Fetcher`, so tests can
//! substitute an in-memory fake and count calls.

mod http;

pub use http::HttpFetcher;

use crate::cache::{Request, Response};
use crate::error::ShellCacheResult;
use async_trait::async_trait;

/// Something that can turn a request into a response
///
/// Non-2xx statuses are ordinary responses. Only transport failures
/// (unreachable host, timeout, malformed response) are returned as
/// `ShellCacheError::Network`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request
    async fn fetch(&self, request: &Request) -> ShellCacheResult<Response>;
}
