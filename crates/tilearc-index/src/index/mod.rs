//! Path-keyed side index for tile archives
//!
//! The index maps the MD5 key of every entry path to the offset of that
//! entry's local file header, so a reader can jump straight to an entry
//! without parsing the archive's central directory.
//!
//! # Binary Format
//!
//! ```text
//! [record 0][record 1]...[record n-1]
//!
//! record = key (16 bytes) + local header offset (u64 little-endian)
//! ```
//!
//! - No header, magic or footer; length is `24 * n`
//! - Records sorted strictly ascending by [`PathKey`](crate::key::PathKey)
//! - Key order compares the low little-endian u64 half first, then the high half
//!
//! # Usage
//!
//! ```rust
//! use tilearc_index::IndexConfig;
//! use tilearc_index::index::{DirectoryEntry, IndexBuilder, OffsetLookup, validate};
//!
//! let config = IndexConfig::default();
//! let mut builder = IndexBuilder::new(&config);
//! builder.extend_from_listing(vec![
//!     DirectoryEntry::file("tileset.json", 0),
//!     DirectoryEntry::file("tiles/0.b3dm", 512),
//! ]);
//! let (index, _summary) = builder.finish()?;
//!
//! assert_eq!(index.offset_of("tiles/0.b3dm"), Some(512));
//! assert!(validate(index.records(), config.collision_policy).is_valid());
//! # Ok::<(), tilearc_index::IndexError>(())
//! ```

mod builder;
mod reader;
mod record;
mod repair;
mod report;
mod validator;

pub use builder::{
    BuildSummary, DirectoryEntry, IndexBuilder, build_from_listing, build_from_report,
    ensure_writable, write_blob, write_index_file,
};
pub use reader::{OffsetLookup, SortedIndex};
pub use record::{IndexRecord, decode_records, encode_records};
pub use repair::{RepairSummary, reoffset, repair};
pub use report::{
    DriftReason, ENTRY_HEADER_MARKER, OFFSET_MARKER, ReportEntries, ReportEntry, ScanState, Step,
    transition,
};
pub use validator::{Collision, OrderViolation, ValidationReport, validate};

/// Size of one serialized index record in bytes
pub const RECORD_SIZE: usize = 24;
