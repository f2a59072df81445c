//! Zip archive plumbing for tile archives
//!
//! Tile archives are ordinary zip files whose last central directory entry is
//! the embedded index. This module holds the record layouts, the bootstrap
//! parser that pulls the embedded index out of the archive trailer, a full
//! central directory lister, and a writer that packs entries and appends an
//! index.
//!
//! # Archive Trailer
//!
//! ```text
//! ... [local header + data]* [central directory header]* ... [index header]
//!     [zip64 end record + locator]? [end of central directory + comment]
//! ```
//!
//! Offsets and sizes that do not fit in 32 bits hold `0xFFFFFFFF` and are
//! stored in the zip64 extended information extra field instead.

mod bootstrap;
pub mod constants;
mod directory;
pub mod headers;
mod writer;

pub use bootstrap::{ArchiveBootstrap, EmbeddedIndex};
pub use constants::{LOCAL_FILE_HEADER_SIGNATURE, MAX_TRAILER_SIZE};
pub use directory::{ArchiveEntry, CentralDirectory};
pub use headers::{
    CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader, Zip64EndLocator,
    Zip64EndRecord, Zip64ExtendedInfo,
};
pub use writer::{ArchiveWriter, EntryCompression};
