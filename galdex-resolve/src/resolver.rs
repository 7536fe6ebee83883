//! Query resolution orchestration.
//!
//! [`Resolver::resolve`] is the single entry point: it validates the query,
//! pins a title-index generation, fans out every remote fetch concurrently,
//! folds the resulting sets over the ordered base, and applies the
//! positional range exactly once.

use crate::algebra;
use crate::error::{ResolveError, Result};
use crate::idset::IdentifierSet;
use crate::paths;
use crate::query::{IdRange, PopularityPeriod, Query};
use crate::tag::Tag;
use futures::future::try_join_all;
use galdex_core::{ByteRange, RangeFetch};
use galdex_index::{nozomi, BTreeSearcher, GalleryId, NozomiOrder};
use sha2::{Digest, Sha256};

/// Identifier resolution engine over a byte-range fetcher.
///
/// Holds no per-query state; one resolver may serve any number of sequential
/// or concurrent `resolve` calls.
#[derive(Debug)]
pub struct Resolver<F: RangeFetch> {
    fetcher: F,
}

impl<F: RangeFetch> Resolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// The underlying fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve a query into an ordered identifier list.
    ///
    /// Fails with `InvalidQuery` before any remote work if the query is
    /// structurally broken; any fetch or decode failure aborts the whole
    /// call (there is no partial-result mode).
    pub async fn resolve(&self, query: &Query) -> Result<Vec<GalleryId>> {
        query.validate()?;
        let words = query.title_words()?;
        let has_filters = !words.is_empty() || !query.tags.is_empty();

        tracing::debug!(
            words = words.len(),
            tags = query.tags.len(),
            popularity = ?query.popularity,
            range = ?query.range,
            "resolving query"
        );

        // With no title/tag filters the base fetch itself is range-sliced at
        // the byte level; otherwise the slice happens after filtering.
        let byte_slice = if has_filters {
            None
        } else {
            query.range.map(nozomi_byte_range)
        };

        // The version token only pins B-tree reads, so tag/range-only
        // queries skip the extra round trip. All word lookups in this call
        // share the one token; nozomi fetches are not version-pinned and may
        // reflect a slightly newer catalog snapshot.
        let version = match words.is_empty() {
            true => None,
            false => Some(self.index_version().await?),
        };

        let word_sets = async {
            let Some(version) = version.as_deref() else {
                return Ok(Vec::new());
            };
            let index_path = paths::index_path(version);
            let data_path = paths::data_path(version);
            try_join_all(
                words
                    .iter()
                    .map(|word| self.word_set(&index_path, &data_path, word)),
            )
            .await
        };
        let tag_sets = try_join_all(
            query
                .tags
                .iter()
                .map(|tag| self.tag_set(tag, query.popularity)),
        );
        let base = self.fetch_base(query.popularity, byte_slice);

        let (base, word_sets, tag_sets) = tokio::try_join!(base, word_sets, tag_sets)?;

        let filters: Vec<IdentifierSet> = word_sets.into_iter().chain(tag_sets).collect();
        let mut ids = algebra::combine(base, &filters);

        if has_filters {
            if let Some(range) = query.range {
                ids = slice_range(ids, range);
            }
        }

        tracing::debug!(count = ids.len(), "query resolved");
        Ok(ids)
    }

    /// Fetch the active title-index generation token.
    async fn index_version(&self) -> Result<String> {
        let bytes = self.fetcher.fetch(paths::VERSION_PATH, None).await?;
        let version = String::from_utf8(bytes)
            .map_err(|e| ResolveError::malformed(format!("index version is not UTF-8: {e}")))?;
        let version = version.trim().to_string();
        if version.is_empty() {
            return Err(ResolveError::malformed("index version is empty"));
        }
        Ok(version)
    }

    /// Fetch and decode the base file that anchors the result ordering.
    async fn fetch_base(
        &self,
        popularity: Option<PopularityPeriod>,
        byte_slice: Option<ByteRange>,
    ) -> Result<Vec<GalleryId>> {
        let path = paths::base_path(popularity);
        let bytes = self.fetcher.fetch(&path, byte_slice).await?;
        Ok(nozomi::decode(&bytes, NozomiOrder::Natural)?)
    }

    /// Resolve one title word into an inclusion set.
    ///
    /// Title search is advisory: a word missing from the index yields an
    /// empty set (which can only narrow the result), never an error.
    async fn word_set(
        &self,
        index_path: &str,
        data_path: &str,
        word: &str,
    ) -> Result<IdentifierSet> {
        let digest = Sha256::digest(word.as_bytes());
        let key = &digest[..4];

        let searcher = BTreeSearcher::new(&self.fetcher, index_path);
        let Some(data_ref) = searcher.search(key).await? else {
            tracing::debug!(word, "title word not in index");
            return Ok(IdentifierSet::default());
        };
        if data_ref.length == 0 {
            return Ok(IdentifierSet::default());
        }

        let bytes = self
            .fetcher
            .fetch(
                data_path,
                Some(ByteRange::with_len(data_ref.offset, data_ref.length as u64)),
            )
            .await?;
        let ids = nozomi::decode(&bytes, NozomiOrder::Reversed)?;
        Ok(IdentifierSet::inclusion(ids))
    }

    /// Fetch one tag's nozomi file into a set carrying the tag's polarity.
    async fn tag_set(
        &self,
        tag: &Tag,
        popularity: Option<PopularityPeriod>,
    ) -> Result<IdentifierSet> {
        let path = paths::tag_path(tag, popularity);
        let bytes = self.fetcher.fetch(&path, None).await?;
        let ids = nozomi::decode(&bytes, NozomiOrder::Reversed)?;
        Ok(IdentifierSet::with_polarity(ids, tag.exclusion))
    }
}

/// Byte range covering identifier positions `[start, end]` of a nozomi file.
fn nozomi_byte_range(range: IdRange) -> ByteRange {
    let start = range.start.unwrap_or(0) as u64 * 4;
    match range.end {
        Some(end) => ByteRange::new(start, (end as u64 + 1) * 4),
        None => ByteRange::starting_at(start),
    }
}

/// Positional slice with an inclusive end, clamped to the list bounds.
fn slice_range(ids: Vec<GalleryId>, range: IdRange) -> Vec<GalleryId> {
    let start = range.start.unwrap_or(0).min(ids.len());
    let end = match range.end {
        Some(end) => end.saturating_add(1).min(ids.len()),
        None => ids.len(),
    };
    if start >= end {
        return Vec::new();
    }
    ids[start..end].to_vec()
}
