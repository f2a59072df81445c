//! Path-keyed side index for 3D tile zip archives
//!
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! Tile archives (`.3tz`) pack millions of small tile files into one zip
//! archive. Resolving a tile through the central directory means parsing the
//! whole directory first; this crate instead keeps a compact, sorted index of
//! `md5(path) -> local header offset` records, embedded as the archive's last
//! entry, so a reader needs only the archive trailer and a binary search.
//!
//! # Operations
//!
//! - **Build** an index from a directory listing or from a streamed
//!   `zipinfo -v` style report ([`index::IndexBuilder`])
//! - **Extract** the embedded index from an archive trailer
//!   ([`archive::ArchiveBootstrap`])
//! - **Look up** an entry path ([`index::SortedIndex::lookup`])
//! - **Validate** ordering and detect key collisions ([`index::validate`])
//! - **Repair** an index after the archive was re-packed ([`index::repair`])
//!
//! # Example
//!
//! ```rust
//! use tilearc_index::{IndexConfig, SortedIndex};
//! use tilearc_index::archive::{ArchiveBootstrap, ArchiveWriter, EntryCompression};
//! use tilearc_index::index::IndexBuilder;
//! use std::io::Cursor;
//!
//! let config = IndexConfig::default();
//! let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()));
//! writer.add_file("tileset.json", b"{}", EntryCompression::Stored)?;
//! let tile = writer.add_file("tiles/0.b3dm", b"b3dm", EntryCompression::Stored)?;
//!
//! let mut builder = IndexBuilder::new(&config);
//! builder.extend_from_listing(writer.listing());
//! let (index, _) = builder.finish()?;
//! let archive = writer
//!     .finish_with_index(&index, &config, EntryCompression::Stored)?
//!     .into_inner();
//!
//! let embedded = ArchiveBootstrap::new(&config).extract(Cursor::new(archive))?;
//! let recovered = SortedIndex::from_bytes(&embedded.into_blob()?)?;
//! assert_eq!(recovered.lookup("tiles/0.b3dm").map(|r| r.offset), Some(tile));
//! # Ok::<(), tilearc_index::IndexError>(())
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod config;
pub mod error;
pub mod index;
pub mod key;

pub use config::{CollisionPolicy, IndexConfig};
pub use error::{IndexError, IndexResult};
pub use index::{IndexRecord, OffsetLookup, SortedIndex};
pub use key::PathKey;
