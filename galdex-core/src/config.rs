//! Configuration for the HTTP fetcher.

use serde::Deserialize;

/// Transport policy for [`crate::HttpFetcher`].
///
/// The engine itself carries no retry or backoff policy (that belongs to the
/// transport collaborator), so this is deliberately small: how long a single
/// request may take, and how the client identifies itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: concat!("galdex/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
