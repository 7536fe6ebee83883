//! Identifier resolution engine for the galdex catalog.
//!
//! Resolves abstract queries (free-text title words, signed tags, popularity
//! orderings, numeric ranges) into concrete, ordered lists of catalog
//! identifiers without ever holding the full catalog locally. All remote
//! access goes through the `galdex-core` fetch seam; the binary formats live
//! in `galdex-index`.
//!
//! # Architecture
//!
//! - [`Resolver`]: the single entry point for query resolution
//! - [`Query`] / [`Tag`] / [`TagKind`]: the query surface
//! - [`IdentifierSet`] + [`algebra`]: positive/negative set combination
//! - [`SubdomainResolver`]: directive-document-driven subdomain selection,
//!   independent of query resolution
//!
//! # Example
//!
//! ```ignore
//! use galdex_core::HttpFetcher;
//! use galdex_resolve::{Query, Resolver, Tag, TagKind};
//!
//! let resolver = Resolver::new(HttpFetcher::new("https://idx.example.net"));
//! let query = Query::default()
//!     .with_title("midnight library")
//!     .with_tag(Tag::excluded(TagKind::Type, "anime"));
//! let ids = resolver.resolve(&query).await?;
//! ```

pub mod algebra;
pub mod error;
pub mod idset;
pub mod paths;
pub mod query;
pub mod resolver;
pub mod subdomain;
pub mod tag;

pub use error::{ResolveError, Result};
pub use idset::IdentifierSet;
pub use query::{IdRange, PopularityPeriod, Query};
pub use resolver::Resolver;
pub use subdomain::{SubdomainResolver, PRIMARY_SUBDOMAIN, SECONDARY_SUBDOMAIN};
pub use tag::{Tag, TagKind};

pub use galdex_index::GalleryId;
