//! Remote object path layout.
//!
//! Every remote object the resolver touches is addressed through one of
//! these functions, so the catalog's directory scheme lives in exactly one
//! place.

use crate::query::PopularityPeriod;
use crate::tag::{Tag, TagKind};

/// Small text file naming the active title-index generation.
pub const VERSION_PATH: &str = "galleries/version";

/// Default all-identifiers nozomi file.
pub const ALL_PATH: &str = "index/all.nozomi";

/// B-tree index blob for a given index generation.
pub fn index_path(version: &str) -> String {
    format!("galleries/galleries.{version}.index")
}

/// Companion data blob for a given index generation.
pub fn data_path(version: &str) -> String {
    format!("galleries/galleries.{version}.data")
}

/// Popularity-ordered counterpart of [`ALL_PATH`].
pub fn popularity_path(period: PopularityPeriod) -> String {
    format!("popular/{}/all.nozomi", period.as_str())
}

/// The base file a query's ordering is anchored on.
pub fn base_path(popularity: Option<PopularityPeriod>) -> String {
    match popularity {
        Some(period) => popularity_path(period),
        None => ALL_PATH.to_string(),
    }
}

/// Nozomi file for one tag.
///
/// Language tags select per-language editions of the whole index and are the
/// only kind with popularity-ordered variants. Male and female tags share
/// the generic tag namespace under qualified names.
pub fn tag_path(tag: &Tag, popularity: Option<PopularityPeriod>) -> String {
    match tag.kind {
        TagKind::Language => match popularity {
            Some(period) => format!("popular/{}/{}.nozomi", period.as_str(), tag.name),
            None => format!("index/{}.nozomi", tag.name),
        },
        TagKind::Male => format!("tag/male:{}.nozomi", tag.name),
        TagKind::Female => format!("tag/female:{}.nozomi", tag.name),
        TagKind::Artist
        | TagKind::Group
        | TagKind::Type
        | TagKind::Series
        | TagKind::Character
        | TagKind::Tag => format!("{}/{}.nozomi", tag.kind.as_str(), tag.name),
    }
}
