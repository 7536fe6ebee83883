//! Identifier sets with a fixed inclusion/exclusion polarity.

use galdex_index::GalleryId;
use rustc_hash::FxHashSet;

/// A set of unique identifiers plus the polarity it participates in set
/// algebra with.
///
/// The polarity is fixed at construction: an inclusion set must *contain* a
/// candidate for it to survive, an exclusion set must *not*. Each set is
/// owned by the resolution call that created it and is never shared across
/// concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct IdentifierSet {
    ids: FxHashSet<GalleryId>,
    exclusion: bool,
}

impl IdentifierSet {
    /// An inclusion set over the given identifiers.
    pub fn inclusion(ids: impl IntoIterator<Item = GalleryId>) -> Self {
        Self::with_polarity(ids, false)
    }

    /// An exclusion set over the given identifiers.
    pub fn exclusion(ids: impl IntoIterator<Item = GalleryId>) -> Self {
        Self::with_polarity(ids, true)
    }

    /// A set with explicit polarity.
    pub fn with_polarity(ids: impl IntoIterator<Item = GalleryId>, exclusion: bool) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            exclusion,
        }
    }

    /// Whether this set excludes rather than intersects.
    pub fn is_exclusion(&self) -> bool {
        self.exclusion
    }

    pub fn contains(&self, id: GalleryId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The keep predicate of the set algebra: an inclusion set keeps members,
    /// an exclusion set keeps non-members.
    pub fn keeps(&self, id: GalleryId) -> bool {
        self.contains(id) != self.exclusion
    }
}
