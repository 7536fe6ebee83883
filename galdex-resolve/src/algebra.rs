//! Positive/negative set combination over an ordered base.

use crate::idset::IdentifierSet;
use galdex_index::GalleryId;

/// Filter an ordered base sequence through every supplied set.
///
/// The base establishes both the universe and the output ordering; each
/// filter is an independent predicate, so the fold is associative and the
/// filters may have been fetched in any order. An empty result is valid.
pub fn combine(base: Vec<GalleryId>, filters: &[IdentifierSet]) -> Vec<GalleryId> {
    if filters.is_empty() {
        return base;
    }
    base.into_iter()
        .filter(|&id| filters.iter().all(|set| set.keeps(id)))
        .collect()
}
