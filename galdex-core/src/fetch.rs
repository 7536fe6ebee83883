//! Byte-range fetch boundary.
//!
//! This module defines the transport seam the resolution engine reads the
//! remote catalog through. Every remote object (nozomi files, B-tree pages,
//! the companion data blob, the directive document) is fetched through the
//! same operation: "give me bytes `[start, end)` of object `path`".
//!
//! ## Implementations
//!
//! - [`HttpFetcher`]: production client over HTTPS with `Range` headers
//! - [`MemoryFetcher`]: in-memory map for tests and embedding
//!
//! Neither implementation retries or caches; both concerns belong to the
//! transport collaborator above this crate.

use crate::config::FetcherConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Half-open byte range `[start, end)` within a remote object.
///
/// An absent `end` means "through the end of the object". On the wire this is
/// rendered as an inclusive HTTP `Range` header (`bytes=start-(end-1)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset, inclusive.
    pub start: u64,
    /// One past the last byte offset; `None` reads to the end of the object.
    pub end: Option<u64>,
}

impl ByteRange {
    /// Range covering `[start, end)`.
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Open-ended range from `start` through the end of the object.
    pub fn starting_at(start: u64) -> Self {
        Self { start, end: None }
    }

    /// Range of `length` bytes beginning at `offset`.
    pub fn with_len(offset: u64, length: u64) -> Self {
        Self {
            start: offset,
            end: Some(offset + length),
        }
    }

    /// Render as an HTTP `Range` header value.
    ///
    /// The header's end offset is inclusive, hence the `- 1`.
    pub fn header_value(&self) -> String {
        match self.end {
            Some(end) => format!("bytes={}-{}", self.start, end.saturating_sub(1)),
            None => format!("bytes={}-", self.start),
        }
    }
}

/// Byte-range read access to remote objects.
///
/// A `None` range fetches the whole object. Implementations must treat HTTP
/// 200 and 206 as equally successful and surface every other status as
/// [`Error::Rejected`] carrying the requested path.
#[async_trait]
pub trait RangeFetch: Debug + Send + Sync {
    /// Fetch `range` of the object at `path`, or the whole object.
    async fn fetch(&self, path: &str, range: Option<ByteRange>) -> Result<Vec<u8>>;
}

// ============================================================================
// HttpFetcher
// ============================================================================

/// Production fetcher issuing ranged GET requests against a base URL.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpFetcher {
    /// Create a fetcher with default transport policy.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root URL the catalog's objects hang under
    ///   (e.g. `https://idx.example.net`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(base_url, FetcherConfig::default())
    }

    /// Create a fetcher with an explicit [`FetcherConfig`].
    pub fn with_config(base_url: impl Into<String>, config: FetcherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent)
            .build()
            .expect("failed to build HTTP client");

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    /// Build the full request URL for a remote object path.
    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RangeFetch for HttpFetcher {
    async fn fetch(&self, path: &str, range: Option<ByteRange>) -> Result<Vec<u8>> {
        let url = self.object_url(path);

        let mut request = self.client.get(&url);
        if let Some(range) = range {
            request = request.header(reqwest::header::RANGE, range.header_value());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::io(format!("fetch timeout for {path}: {e}"))
            } else if e.is_connect() {
                Error::io(format!("connection failed for {path}: {e}"))
            } else {
                Error::io(format!("request failed for {path}: {e}"))
            }
        })?;

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| Error::io(format!("failed to read body for {path}: {e}")))?;
                tracing::debug!(path = %path, len = bytes.len(), ranged = range.is_some(), "fetched");
                Ok(bytes.to_vec())
            }
            // Full and partial content are the only successes; everything
            // else, 404 included, rejects the request as a whole.
            _ => Err(Error::rejected(path, status.as_u16())),
        }
    }
}

// ============================================================================
// MemoryFetcher
// ============================================================================

/// In-memory fetcher for tests and embedding.
///
/// Stores whole objects in a HashMap with interior mutability (via
/// `Arc<RwLock<...>>`) and serves range requests by slicing. A range whose
/// start lies at or past the end of the object yields an empty buffer, which
/// is how callers probing for absent B-tree pages expect out-of-bounds reads
/// to behave.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryFetcher {
    /// Create a new empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object at the given path.
    ///
    /// Note: takes `&self` (not `&mut self`) due to interior mutability.
    pub fn insert(&self, path: impl Into<String>, data: Vec<u8>) {
        self.objects
            .write()
            .expect("RwLock poisoned")
            .insert(path.into(), data);
    }
}

#[async_trait]
impl RangeFetch for MemoryFetcher {
    async fn fetch(&self, path: &str, range: Option<ByteRange>) -> Result<Vec<u8>> {
        let objects = self.objects.read().expect("RwLock poisoned");
        let data = objects
            .get(path)
            .ok_or_else(|| Error::rejected(path, 404))?;

        let bytes = match range {
            None => data.clone(),
            Some(range) => {
                let len = data.len() as u64;
                let start = range.start.min(len) as usize;
                let end = range.end.unwrap_or(len).min(len) as usize;
                if start >= end {
                    Vec::new()
                } else {
                    data[start..end].to_vec()
                }
            }
        };
        Ok(bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
