//! On-disk B-tree page format and remote search.
//!
//! The title index is a persistent B-tree whose pages live behind a
//! byte-range-addressable blob. Searching never loads the tree: each level
//! costs exactly one ranged read of a fixed window, so a lookup is
//! `O(tree height)` round trips regardless of catalog size.
//!
//! # Page layout (all integers big-endian)
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ key_count: i32                                       │
//! │ For each key:                                        │
//! │   key_len: i32 (1..=31, else malformed)              │
//! │   key: [u8; key_len]                                 │
//! │ data_count: i32                                      │
//! │ For each data pointer:                               │
//! │   offset: u64    (into the companion data blob)      │
//! │   length: i32                                        │
//! │ child_addresses: [u64; 17]  (0 = absent)             │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Pages are packed back to back, so a fixed-window read may spill into the
//! next page; decoding consumes a prefix of the window and ignores the tail.
//! An empty read means the page is absent (an empty tree), which is a
//! "not found", not an error.

use crate::error::{IndexError, Result};
use galdex_core::{ByteRange, RangeFetch};
use std::cmp::Ordering;

/// Fixed window size for page reads. No encoded page exceeds this.
pub const NODE_WINDOW: u64 = 464;

/// Every page carries exactly this many child address slots.
pub const CHILD_COUNT: usize = 17;

/// Address of the root page within the index blob.
const ROOT_ADDRESS: u64 = 0;

/// Keys are variable-length, bounded by the format.
const MAX_KEY_LEN: usize = 31;

/// Pointer to a byte range in the companion data blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRef {
    /// Byte offset into the data blob.
    pub offset: u64,
    /// Length of the pointed-to region in bytes.
    pub length: u32,
}

/// One decoded B-tree page.
///
/// Transient: built per fetched page and discarded after the search step
/// that used it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNode {
    /// Keys in stored (ascending byte-lexicographic) order.
    pub keys: Vec<Vec<u8>>,
    /// Data pointers, parallel to `keys`. The format reads this count
    /// independently of the key count; whichever index a search lands on
    /// must index both.
    pub datas: Vec<DataRef>,
    /// Child page addresses; 0 marks an absent child.
    pub children: [u64; CHILD_COUNT],
}

impl IndexNode {
    /// Decode a page from the prefix of a fetched window.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut pos = 0usize;

        let key_count = read_i32(data, &mut pos, "key count")?;
        if key_count < 0 {
            return Err(IndexError::malformed(format!(
                "negative key count {key_count}"
            )));
        }
        let mut keys = Vec::with_capacity(key_count as usize);
        for _ in 0..key_count {
            let key_len = read_i32(data, &mut pos, "key length")?;
            if key_len < 1 || key_len as usize > MAX_KEY_LEN {
                return Err(IndexError::malformed(format!(
                    "key length {key_len} outside 1..={MAX_KEY_LEN}"
                )));
            }
            let key_len = key_len as usize;
            ensure_len(data, pos, key_len, "key bytes")?;
            keys.push(data[pos..pos + key_len].to_vec());
            pos += key_len;
        }

        let data_count = read_i32(data, &mut pos, "data count")?;
        if data_count < 0 {
            return Err(IndexError::malformed(format!(
                "negative data count {data_count}"
            )));
        }
        let mut datas = Vec::with_capacity(data_count as usize);
        for _ in 0..data_count {
            let offset = read_u64(data, &mut pos, "data offset")?;
            let length = read_i32(data, &mut pos, "data length")?;
            if length < 0 {
                return Err(IndexError::malformed(format!(
                    "negative data length {length}"
                )));
            }
            datas.push(DataRef {
                offset,
                length: length as u32,
            });
        }

        let mut children = [0u64; CHILD_COUNT];
        for slot in children.iter_mut() {
            *slot = read_u64(data, &mut pos, "child address")?;
        }

        Ok(Self {
            keys,
            datas,
            children,
        })
    }

    /// Encode this page. `decode(encode(node))` reproduces `node` exactly.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.keys.len() as i32).to_be_bytes());
        for key in &self.keys {
            buf.extend_from_slice(&(key.len() as i32).to_be_bytes());
            buf.extend_from_slice(key);
        }
        buf.extend_from_slice(&(self.datas.len() as i32).to_be_bytes());
        for data in &self.datas {
            buf.extend_from_slice(&data.offset.to_be_bytes());
            buf.extend_from_slice(&(data.length as i32).to_be_bytes());
        }
        for child in &self.children {
            buf.extend_from_slice(&child.to_be_bytes());
        }
        buf
    }

    /// A page with no live child addresses is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(|&addr| addr == 0)
    }
}

/// Compare two keys byte-lexicographically over their common prefix.
///
/// A key that is a prefix of the other compares equal: search keys are fixed
/// 4-byte hash prefixes, and the format never relies on a length tiebreak.
fn compare_keys(a: &[u8], b: &[u8]) -> Ordering {
    let common = a.len().min(b.len());
    a[..common].cmp(&b[..common])
}

/// Locate `key` within a page: the index of the first stored key that is
/// `>= key` (or `keys.len()` if none is), and whether the comparison there
/// was exact.
fn locate_key(key: &[u8], node: &IndexNode) -> (usize, bool) {
    for (i, stored) in node.keys.iter().enumerate() {
        match compare_keys(key, stored) {
            Ordering::Equal => return (i, true),
            Ordering::Less => return (i, false),
            Ordering::Greater => {}
        }
    }
    (node.keys.len(), false)
}

/// Out-of-process binary search over remote B-tree pages.
///
/// Holds no state beyond the fetcher and the index blob path; every page
/// visit is a fresh ranged read and nothing is cached across calls.
#[derive(Debug)]
pub struct BTreeSearcher<'a, F: RangeFetch> {
    fetcher: &'a F,
    index_path: &'a str,
}

impl<'a, F: RangeFetch> BTreeSearcher<'a, F> {
    /// Create a searcher over the index blob at `index_path`.
    pub fn new(fetcher: &'a F, index_path: &'a str) -> Self {
        Self {
            fetcher,
            index_path,
        }
    }

    /// Resolve `key` to its data pointer, or `None` if the key is absent.
    ///
    /// Starts at the root (address 0) and descends one fetched page per
    /// level. Absent pages, leaves without a match, and absent child slots
    /// all resolve to `None`.
    pub async fn search(&self, key: &[u8]) -> Result<Option<DataRef>> {
        let mut address = ROOT_ADDRESS;
        loop {
            let Some(node) = self.node_at(address).await? else {
                return Ok(None);
            };

            let (index, exact) = locate_key(key, &node);
            if exact {
                let data = node.datas.get(index).copied().ok_or_else(|| {
                    IndexError::malformed(format!(
                        "page at {address} has no data pointer for key index {index}"
                    ))
                })?;
                return Ok(Some(data));
            }
            if node.is_leaf() {
                return Ok(None);
            }
            let child = node.children[index];
            if child == 0 {
                return Ok(None);
            }
            address = child;
        }
    }

    /// Fetch and decode one page. An empty read means the page is absent.
    async fn node_at(&self, address: u64) -> Result<Option<IndexNode>> {
        let bytes = self
            .fetcher
            .fetch(
                self.index_path,
                Some(ByteRange::with_len(address, NODE_WINDOW)),
            )
            .await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        tracing::debug!(path = %self.index_path, address, "decoding index page");
        IndexNode::decode(&bytes).map(Some)
    }
}

// ── Cursor helpers ───────────────────────────────────────────────────────────

/// Check that `data[pos..pos+need]` is within bounds.
#[inline]
fn ensure_len(data: &[u8], pos: usize, need: usize, ctx: &str) -> Result<()> {
    if pos + need > data.len() {
        Err(IndexError::malformed(format!(
            "page truncated at {ctx} (need {need} bytes at offset {pos}, have {})",
            data.len()
        )))
    } else {
        Ok(())
    }
}

/// Read an i32 BE at `pos`, advancing.
#[inline]
fn read_i32(data: &[u8], pos: &mut usize, ctx: &str) -> Result<i32> {
    ensure_len(data, *pos, 4, ctx)?;
    let v = i32::from_be_bytes(data[*pos..*pos + 4].try_into().unwrap());
    *pos += 4;
    Ok(v)
}

/// Read a u64 BE at `pos`, advancing.
#[inline]
fn read_u64(data: &[u8], pos: &mut usize, ctx: &str) -> Result<u64> {
    ensure_len(data, *pos, 8, ctx)?;
    let v = u64::from_be_bytes(data[*pos..*pos + 8].try_into().unwrap());
    *pos += 8;
    Ok(v)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use galdex_core::MemoryFetcher;

    fn leaf(keys: Vec<Vec<u8>>, datas: Vec<DataRef>) -> IndexNode {
        IndexNode {
            keys,
            datas,
            children: [0; CHILD_COUNT],
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let mut children = [0u64; CHILD_COUNT];
        children[0] = 464;
        children[2] = 928;
        let node = IndexNode {
            keys: vec![vec![0x10, 0x20, 0x30, 0x40], vec![0xaa]],
            datas: vec![
                DataRef {
                    offset: 1234,
                    length: 88,
                },
                DataRef {
                    offset: 0,
                    length: 0,
                },
            ],
            children,
        };
        let encoded = node.encode();
        assert!(encoded.len() as u64 <= NODE_WINDOW);
        assert_eq!(IndexNode::decode(&encoded).unwrap(), node);
    }

    #[test]
    fn test_decode_ignores_window_tail() {
        let node = leaf(vec![vec![1, 2, 3, 4]], vec![DataRef { offset: 9, length: 3 }]);
        let mut bytes = node.encode();
        // Pages are packed; a window read may carry the next page's prefix.
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(IndexNode::decode(&bytes).unwrap(), node);
    }

    #[test]
    fn test_decode_rejects_out_of_range_key_length() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_be_bytes());
        buf.extend_from_slice(&32i32.to_be_bytes()); // 31 is the ceiling
        buf.extend_from_slice(&[0u8; 64]);
        let err = IndexNode::decode(&buf).unwrap_err();
        assert!(matches!(err, IndexError::Malformed(_)));

        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_be_bytes());
        buf.extend_from_slice(&0i32.to_be_bytes());
        buf.extend_from_slice(&[0u8; 64]);
        assert!(IndexNode::decode(&buf).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_page() {
        let node = leaf(vec![vec![1, 2, 3, 4]], vec![DataRef { offset: 9, length: 3 }]);
        let bytes = node.encode();
        let err = IndexNode::decode(&bytes[..bytes.len() - 8]).unwrap_err();
        assert!(matches!(err, IndexError::Malformed(_)));
    }

    #[test]
    fn test_compare_keys_prefix_equal() {
        assert_eq!(compare_keys(&[1, 2], &[1, 2, 3]), Ordering::Equal);
        assert_eq!(compare_keys(&[1, 2, 3], &[1, 2]), Ordering::Equal);
        assert_eq!(compare_keys(&[1, 2, 4], &[1, 3, 0]), Ordering::Less);
        assert_eq!(compare_keys(&[9], &[1, 2, 3]), Ordering::Greater);
    }

    #[test]
    fn test_locate_key_positions() {
        let node = leaf(
            vec![vec![2, 0, 0, 0], vec![5, 0, 0, 0], vec![9, 0, 0, 0]],
            vec![],
        );
        assert_eq!(locate_key(&[1, 0, 0, 0], &node), (0, false));
        assert_eq!(locate_key(&[5, 0, 0, 0], &node), (1, true));
        assert_eq!(locate_key(&[6, 0, 0, 0], &node), (2, false));
        assert_eq!(locate_key(&[255, 0, 0, 0], &node), (3, false));
    }

    #[tokio::test]
    async fn test_search_single_leaf() {
        let fetcher = MemoryFetcher::new();
        let root = leaf(
            vec![vec![0x11, 0x11, 0x11, 0x11], vec![0x55, 0x55, 0x55, 0x55]],
            vec![
                DataRef {
                    offset: 0,
                    length: 8,
                },
                DataRef {
                    offset: 8,
                    length: 12,
                },
            ],
        );
        fetcher.insert("idx", root.encode());

        let searcher = BTreeSearcher::new(&fetcher, "idx");
        let hit = searcher.search(&[0x55, 0x55, 0x55, 0x55]).await.unwrap();
        assert_eq!(
            hit,
            Some(DataRef {
                offset: 8,
                length: 12
            })
        );

        let miss = searcher.search(&[0x22, 0x22, 0x22, 0x22]).await.unwrap();
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn test_search_descends_into_children() {
        let fetcher = MemoryFetcher::new();

        // Child page holding the target key, packed after the root window.
        let child = leaf(
            vec![vec![0x30, 0, 0, 0]],
            vec![DataRef {
                offset: 100,
                length: 4,
            }],
        );

        let mut children = [0u64; CHILD_COUNT];
        children[0] = NODE_WINDOW; // left child: keys below the separator
        let root = IndexNode {
            keys: vec![vec![0x80, 0, 0, 0]],
            datas: vec![DataRef {
                offset: 0,
                length: 0,
            }],
            children,
        };

        let mut blob = root.encode();
        blob.resize(NODE_WINDOW as usize, 0);
        blob.extend_from_slice(&child.encode());
        fetcher.insert("idx", blob);

        let searcher = BTreeSearcher::new(&fetcher, "idx");
        let hit = searcher.search(&[0x30, 0, 0, 0]).await.unwrap();
        assert_eq!(
            hit,
            Some(DataRef {
                offset: 100,
                length: 4
            })
        );

        // Separator position with an absent child slot resolves to None.
        let miss = searcher.search(&[0x90, 0, 0, 0]).await.unwrap();
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn test_search_empty_tree_is_not_found() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("idx", Vec::new());

        let searcher = BTreeSearcher::new(&fetcher, "idx");
        let hit = searcher.search(&[0, 0, 0, 1]).await.unwrap();
        assert_eq!(hit, None);
    }

    #[tokio::test]
    async fn test_search_exact_match_without_data_pointer_is_malformed() {
        let fetcher = MemoryFetcher::new();
        let root = leaf(vec![vec![1, 2, 3, 4]], vec![]);
        fetcher.insert("idx", root.encode());

        let searcher = BTreeSearcher::new(&fetcher, "idx");
        let err = searcher.search(&[1, 2, 3, 4]).await.unwrap_err();
        assert!(matches!(err, IndexError::Malformed(_)));
    }
}
