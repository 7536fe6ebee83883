//! Query surface and validation.

use crate::error::{ResolveError, Result};
use crate::tag::Tag;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Popularity ordering window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopularityPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl PopularityPeriod {
    /// Canonical lowercase name, as it appears in remote paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            PopularityPeriod::Day => "day",
            PopularityPeriod::Week => "week",
            PopularityPeriod::Month => "month",
            PopularityPeriod::Year => "year",
        }
    }
}

/// Positional range over the resolved identifier list.
///
/// `start` is inclusive and defaults to 0; `end` is *also* inclusive (the
/// upstream convention this engine preserves), and absent means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl IdRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

/// An abstract catalog query.
///
/// All parts are optional and freely combinable; an entirely empty query
/// resolves to the full catalog in default order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    /// Free-text title; whitespace-delimited words are looked up
    /// independently and intersected.
    pub title: Option<String>,
    /// Signed tags, applied in the order supplied.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Positional slice of the final list.
    pub range: Option<IdRange>,
    /// Popularity ordering; changes which base file anchors the result.
    pub popularity: Option<PopularityPeriod>,
}

impl Query {
    /// Set the title filter.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a tag filter.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Set the positional range.
    pub fn with_range(mut self, range: IdRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Set the popularity ordering.
    pub fn with_popularity(mut self, period: PopularityPeriod) -> Self {
        self.popularity = Some(period);
        self
    }

    /// Split the title into lowercased lookup words.
    ///
    /// An absent or empty title means "no title filter". A title that is all
    /// whitespace decomposes to zero words and contributes nothing. A title
    /// mixing words with leading, trailing, or repeated spaces is rejected
    /// as `InvalidQuery`.
    pub(crate) fn title_words(&self) -> Result<Vec<String>> {
        let Some(title) = self.title.as_deref() else {
            return Ok(Vec::new());
        };
        if title.is_empty() {
            return Ok(Vec::new());
        }

        let tokens: Vec<&str> = title.split(' ').collect();
        if tokens.iter().all(|word| word.is_empty()) {
            return Ok(Vec::new());
        }
        if tokens.iter().any(|word| word.is_empty()) {
            return Err(ResolveError::invalid_query(
                "title has leading, trailing, or repeated spaces",
            ));
        }
        Ok(tokens.iter().map(|word| word.to_lowercase()).collect())
    }

    /// Reject structurally invalid queries before any remote work.
    pub(crate) fn validate(&self) -> Result<()> {
        let mut seen: FxHashSet<(crate::tag::TagKind, &str)> = FxHashSet::default();
        for tag in &self.tags {
            if !seen.insert((tag.kind, tag.name.as_str())) {
                return Err(ResolveError::invalid_query(format!(
                    "duplicate tag: {}:{}",
                    tag.kind, tag.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TagKind;

    #[test]
    fn test_title_words_lowercases_and_splits() {
        let query = Query::default().with_title("Midnight LIBRARY");
        assert_eq!(query.title_words().unwrap(), vec!["midnight", "library"]);
    }

    #[test]
    fn test_absent_and_empty_titles_have_no_words() {
        assert!(Query::default().title_words().unwrap().is_empty());
        let query = Query::default().with_title("");
        assert!(query.title_words().unwrap().is_empty());
    }

    #[test]
    fn test_whitespace_only_title_has_no_words() {
        let query = Query::default().with_title("   ");
        assert!(query.title_words().unwrap().is_empty());
    }

    #[test]
    fn test_bad_spacing_is_invalid_query() {
        for title in ["  foo", "foo ", "foo  bar"] {
            let query = Query::default().with_title(title);
            assert!(
                matches!(query.title_words(), Err(ResolveError::InvalidQuery(_))),
                "expected InvalidQuery for {title:?}"
            );
        }
    }

    #[test]
    fn test_duplicate_tag_is_invalid_query() {
        let query = Query::default()
            .with_tag(Tag::new(TagKind::Female, "witch"))
            .with_tag(Tag::excluded(TagKind::Female, "witch"));
        assert!(matches!(
            query.validate(),
            Err(ResolveError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_distinct_tags_validate() {
        let query = Query::default()
            .with_tag(Tag::new(TagKind::Female, "witch"))
            .with_tag(Tag::new(TagKind::Male, "witch"));
        assert!(query.validate().is_ok());
    }
}
