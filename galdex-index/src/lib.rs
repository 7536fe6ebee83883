//! Remote binary index formats for the galdex resolution engine.
//!
//! This crate owns the two wire formats the catalog exposes itself through:
//! flat big-endian identifier arrays ("nozomi" files), and packed B-tree
//! pages mapping hashed keys to byte ranges in a companion data blob. It
//! also owns the read-side search that walks the B-tree through ranged
//! remote reads, one fresh fetch per tree level.

pub mod btree;
pub mod error;
pub mod nozomi;

// ── Key read-side types ──────────────────────────────────────────────────────
pub use btree::{BTreeSearcher, DataRef, IndexNode, CHILD_COUNT, NODE_WINDOW};
pub use error::{IndexError, Result};
pub use nozomi::{GalleryId, NozomiOrder};
