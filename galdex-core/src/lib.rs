//! Transport boundary and shared primitives for the galdex resolution engine.
//!
//! This crate owns the byte-range fetch seam that everything above it depends
//! on: the [`RangeFetch`] trait, the production [`HttpFetcher`], and the
//! in-memory [`MemoryFetcher`] used by tests and embedders. It knows nothing
//! about the catalog's formats: decoding lives in `galdex-index` and
//! orchestration in `galdex-resolve`.

pub mod config;
pub mod error;
pub mod fetch;

pub use config::FetcherConfig;
pub use error::{Error, Result};
pub use fetch::{ByteRange, HttpFetcher, MemoryFetcher, RangeFetch};
