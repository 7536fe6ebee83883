//! Subdomain code resolution for content-delivery URLs.
//!
//! The delivery network publishes a small, periodically-changing directive
//! document. Three line shapes matter, selected by the line's first
//! character:
//!
//! ```text
//! b: '1712744001/'     -> path code   (offset 4, 2 chars trimmed off the end)
//! o = 1;               -> orientation (character at offset 4 == '0' => true)
//! case 1851:           -> code        (offset 5, 1 char trimmed off the end)
//! ```
//!
//! [`SubdomainResolver::synchronize`] replaces the whole directive snapshot
//! atomically; readers see either the prior complete state or the new one,
//! never a partial mix. Resolution hashes nothing itself: it takes the
//! identifier's content hash and folds its last three hex characters into a
//! small integer whose membership in the code set, compared against the
//! orientation flag, picks one of two subdomain prefixes.

use crate::error::{ResolveError, Result};
use galdex_core::RangeFetch;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

/// Subdomain prefix picked when the membership test agrees with the
/// orientation flag.
pub const PRIMARY_SUBDOMAIN: &str = "aa";

/// Subdomain prefix picked otherwise.
pub const SECONDARY_SUBDOMAIN: &str = "ba";

/// Default remote path of the directive document.
pub const DEFAULT_DIRECTIVES_PATH: &str = "gg.js";

/// One complete directive snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Directives {
    path_code: String,
    orientation: bool,
    codes: FxHashSet<u32>,
}

/// Process-wide subdomain state, explicitly owned and refreshed.
///
/// Starts uninitialized; every successful [`synchronize`](Self::synchronize)
/// fully replaces the snapshot. Safe for one writer concurrent with many
/// readers.
#[derive(Debug)]
pub struct SubdomainResolver<F: RangeFetch> {
    fetcher: F,
    directives_path: String,
    state: RwLock<Option<Directives>>,
}

impl<F: RangeFetch> SubdomainResolver<F> {
    /// Create a resolver reading directives from [`DEFAULT_DIRECTIVES_PATH`].
    pub fn new(fetcher: F) -> Self {
        Self::with_directives_path(fetcher, DEFAULT_DIRECTIVES_PATH)
    }

    /// Create a resolver reading directives from an explicit path.
    pub fn with_directives_path(fetcher: F, path: impl Into<String>) -> Self {
        Self {
            fetcher,
            directives_path: path.into(),
            state: RwLock::new(None),
        }
    }

    /// Fetch the directive document and replace the snapshot.
    ///
    /// On any parse failure the prior snapshot stays in place and the caller
    /// must not trust anything from the failed parse.
    pub async fn synchronize(&self) -> Result<()> {
        let bytes = self.fetcher.fetch(&self.directives_path, None).await?;
        let text = String::from_utf8(bytes).map_err(|e| {
            ResolveError::malformed_directives(format!("directive document is not UTF-8: {e}"))
        })?;
        let directives = parse_directives(&text)?;

        tracing::debug!(
            path_code = %directives.path_code,
            orientation = directives.orientation,
            codes = directives.codes.len(),
            "directives synchronized"
        );
        *self.state.write() = Some(directives);
        Ok(())
    }

    /// Pick the subdomain prefix for an identifier's content hash.
    ///
    /// Fails with `NotSynchronized` before the first successful
    /// [`synchronize`](Self::synchronize).
    pub fn subdomain(&self, hash: &str) -> Result<&'static str> {
        let guard = self.state.read();
        let directives = guard.as_ref().ok_or(ResolveError::NotSynchronized)?;
        let code = code_from_hash_tail(hash)?;
        Ok(
            if directives.codes.contains(&code) == directives.orientation {
                PRIMARY_SUBDOMAIN
            } else {
                SECONDARY_SUBDOMAIN
            },
        )
    }

    /// The current path code, as published by the directive document.
    pub fn path_code(&self) -> Result<String> {
        let guard = self.state.read();
        let directives = guard.as_ref().ok_or(ResolveError::NotSynchronized)?;
        Ok(directives.path_code.clone())
    }

    /// Assemble a content-delivery URL for an identifier's content hash.
    ///
    /// Reads one consistent snapshot: the path code and the subdomain are
    /// taken under a single lock acquisition.
    pub fn route_url(&self, host: &str, hash: &str, ext: &str) -> Result<String> {
        let guard = self.state.read();
        let directives = guard.as_ref().ok_or(ResolveError::NotSynchronized)?;
        let code = code_from_hash_tail(hash)?;
        let subdomain = if directives.codes.contains(&code) == directives.orientation {
            PRIMARY_SUBDOMAIN
        } else {
            SECONDARY_SUBDOMAIN
        };
        Ok(format!(
            "https://{subdomain}.{host}/{}{code}/{hash}.{ext}",
            directives.path_code
        ))
    }
}

/// Fold a content hash's last three hex characters into a small integer.
///
/// The final character supplies the high nibble: a hash ending `...xyz`
/// parses as `z` `x` `y` base 16.
fn code_from_hash_tail(hash: &str) -> Result<u32> {
    if hash.len() < 3 || !hash.is_ascii() {
        return Err(ResolveError::malformed(format!(
            "content hash too short for subdomain code: {hash:?}"
        )));
    }
    let tail = &hash[hash.len() - 3..];
    let (front, last) = tail.split_at(2);
    u32::from_str_radix(&format!("{last}{front}"), 16)
        .map_err(|_| ResolveError::malformed(format!("content hash tail is not hex: {tail:?}")))
}

/// Parse a directive document into a complete snapshot.
fn parse_directives(text: &str) -> Result<Directives> {
    let mut path_code = String::new();
    let mut orientation: Option<bool> = None;
    let mut codes: FxHashSet<u32> = FxHashSet::default();

    for line in text.lines() {
        match line.as_bytes().first() {
            Some(&b'b') => {
                if let Some(code) = line.len().checked_sub(2).and_then(|end| line.get(4..end)) {
                    path_code = code.to_string();
                }
            }
            Some(&b'o') => {
                orientation = Some(line.as_bytes().get(4) == Some(&b'0'));
            }
            Some(&b'c') => {
                let raw = line
                    .len()
                    .checked_sub(1)
                    .and_then(|end| line.get(5..end))
                    .ok_or_else(|| {
                        ResolveError::malformed_directives(format!("truncated code line: {line:?}"))
                    })?;
                let code = raw.trim().parse::<u32>().map_err(|_| {
                    ResolveError::malformed_directives(format!("unparseable code: {raw:?}"))
                })?;
                codes.insert(code);
            }
            _ => {}
        }
    }

    if path_code.is_empty() {
        return Err(ResolveError::malformed_directives("no path code"));
    }
    let Some(orientation) = orientation else {
        return Err(ResolveError::malformed_directives("no orientation line"));
    };
    if codes.is_empty() {
        return Err(ResolveError::malformed_directives("empty code set"));
    }

    Ok(Directives {
        path_code,
        orientation,
        codes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use galdex_core::MemoryFetcher;

    const DOC: &str = "var gg = {\n\
                       b: '1712744001/',\n\
                       o = 0;\n\
                       case 5:\n\
                       case 9:\n\
                       }\n";

    fn resolver_with(doc: &str) -> SubdomainResolver<MemoryFetcher> {
        let fetcher = MemoryFetcher::new();
        fetcher.insert(DEFAULT_DIRECTIVES_PATH, doc.as_bytes().to_vec());
        SubdomainResolver::new(fetcher)
    }

    #[test]
    fn test_parse_directives() {
        let directives = parse_directives(DOC).unwrap();
        assert_eq!(directives.path_code, "1712744001/");
        assert!(directives.orientation); // '0' at offset 4 means true
        assert_eq!(directives.codes, [5, 9].into_iter().collect());
    }

    #[test]
    fn test_parse_orientation_nonzero_is_false() {
        let doc = DOC.replace("o = 0;", "o = 1;");
        let directives = parse_directives(&doc).unwrap();
        assert!(!directives.orientation);
    }

    #[test]
    fn test_parse_rejects_incomplete_documents() {
        // Missing orientation
        let doc = "b: 'x/',\ncase 5:\n";
        assert!(matches!(
            parse_directives(doc),
            Err(ResolveError::MalformedDirectives(_))
        ));
        // Missing path code
        let doc = "o = 0;\ncase 5:\n";
        assert!(matches!(
            parse_directives(doc),
            Err(ResolveError::MalformedDirectives(_))
        ));
        // No codes at all
        let doc = "b: 'x/',\no = 0;\n";
        assert!(matches!(
            parse_directives(doc),
            Err(ResolveError::MalformedDirectives(_))
        ));
        // Unparseable code entry
        let doc = "b: 'x/',\no = 0;\ncase abc:\n";
        assert!(matches!(
            parse_directives(doc),
            Err(ResolveError::MalformedDirectives(_))
        ));
    }

    #[test]
    fn test_code_from_hash_tail_high_nibble_is_last_char() {
        // tail "050" reorders to "005"
        assert_eq!(code_from_hash_tail("abcdef050").unwrap(), 0x005);
        assert_eq!(code_from_hash_tail("abcdef070").unwrap(), 0x007);
        assert_eq!(code_from_hash_tail("ff1").unwrap(), 0x1ff);
        assert!(code_from_hash_tail("ab").is_err());
        assert!(code_from_hash_tail("xyzzy").is_err());
    }

    #[tokio::test]
    async fn test_resolve_before_synchronize_fails() {
        let resolver = resolver_with(DOC);
        let err = resolver.subdomain("abcdef050").unwrap_err();
        assert!(matches!(err, ResolveError::NotSynchronized));
        assert!(matches!(
            resolver.path_code(),
            Err(ResolveError::NotSynchronized)
        ));
    }

    #[tokio::test]
    async fn test_membership_agreeing_with_orientation_is_primary() {
        let resolver = resolver_with(DOC);
        resolver.synchronize().await.unwrap();

        // codes {5, 9}, orientation true: code 5 agrees, code 7 does not.
        assert_eq!(resolver.subdomain("abcdef050").unwrap(), PRIMARY_SUBDOMAIN);
        assert_eq!(
            resolver.subdomain("abcdef070").unwrap(),
            SECONDARY_SUBDOMAIN
        );
    }

    #[tokio::test]
    async fn test_orientation_false_flips_selection() {
        let resolver = resolver_with(&DOC.replace("o = 0;", "o = 1;"));
        resolver.synchronize().await.unwrap();

        assert_eq!(
            resolver.subdomain("abcdef050").unwrap(),
            SECONDARY_SUBDOMAIN
        );
        assert_eq!(resolver.subdomain("abcdef070").unwrap(), PRIMARY_SUBDOMAIN);
    }

    #[tokio::test]
    async fn test_failed_synchronize_keeps_prior_snapshot() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert(DEFAULT_DIRECTIVES_PATH, DOC.as_bytes().to_vec());
        let resolver = SubdomainResolver::new(fetcher.clone());
        resolver.synchronize().await.unwrap();

        fetcher.insert(DEFAULT_DIRECTIVES_PATH, b"o = 0;\n".to_vec());
        let err = resolver.synchronize().await.unwrap_err();
        assert!(matches!(err, ResolveError::MalformedDirectives(_)));

        // Prior snapshot still answers.
        assert_eq!(resolver.path_code().unwrap(), "1712744001/");
        assert_eq!(resolver.subdomain("abcdef050").unwrap(), PRIMARY_SUBDOMAIN);
    }

    #[tokio::test]
    async fn test_route_url_combines_snapshot_fields() {
        let resolver = resolver_with(DOC);
        resolver.synchronize().await.unwrap();

        let url = resolver
            .route_url("img.example.net", "abcdef050", "webp")
            .unwrap();
        assert_eq!(
            url,
            "https://aa.img.example.net/1712744001/5/abcdef050.webp"
        );
    }
}
