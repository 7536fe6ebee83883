//! Tag model.
//!
//! Tag kinds form a closed set; every site that branches on a kind matches
//! exhaustively so a new kind cannot slip through half-handled.

use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of tag namespaces the catalog indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Artist,
    Group,
    Type,
    Language,
    Series,
    Character,
    Male,
    Female,
    Tag,
}

impl TagKind {
    /// Canonical lowercase name, as it appears in remote paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Artist => "artist",
            TagKind::Group => "group",
            TagKind::Type => "type",
            TagKind::Language => "language",
            TagKind::Series => "series",
            TagKind::Character => "character",
            TagKind::Male => "male",
            TagKind::Female => "female",
            TagKind::Tag => "tag",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagKind {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "artist" => Ok(TagKind::Artist),
            "group" => Ok(TagKind::Group),
            "type" => Ok(TagKind::Type),
            "language" => Ok(TagKind::Language),
            "series" => Ok(TagKind::Series),
            "character" => Ok(TagKind::Character),
            "male" => Ok(TagKind::Male),
            "female" => Ok(TagKind::Female),
            "tag" => Ok(TagKind::Tag),
            other => Err(ResolveError::invalid_query(format!(
                "unknown tag kind: {other}"
            ))),
        }
    }
}

/// One signed tag in a query: a kind, a name, and whether matching
/// identifiers are excluded from (rather than intersected into) the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub kind: TagKind,
    pub name: String,
    /// Exclusion polarity; fixed for the life of the tag.
    #[serde(default)]
    pub exclusion: bool,
}

impl Tag {
    /// A positive (intersecting) tag.
    pub fn new(kind: TagKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            exclusion: false,
        }
    }

    /// A negative (excluding) tag.
    pub fn excluded(kind: TagKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            exclusion: true,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exclusion {
            write!(f, "-{}:{}", self.kind, self.name)
        } else {
            write!(f, "{}:{}", self.kind, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            TagKind::Artist,
            TagKind::Group,
            TagKind::Type,
            TagKind::Language,
            TagKind::Series,
            TagKind::Character,
            TagKind::Male,
            TagKind::Female,
            TagKind::Tag,
        ] {
            assert_eq!(kind.as_str().parse::<TagKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_invalid_query() {
        let err = "publisher".parse::<TagKind>().unwrap_err();
        assert!(matches!(err, ResolveError::InvalidQuery(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Tag::new(TagKind::Female, "witch").to_string(), "female:witch");
        assert_eq!(
            Tag::excluded(TagKind::Type, "anime").to_string(),
            "-type:anime"
        );
    }
}
