//! Tile archive writer
//!
//! Writes a plain zip archive entry by entry and can append a serialized
//! index as the final, reserved entry so readers find it through the
//! archive trailer.
//!
//! # Example
//!
//! ```rust
//! use tilearc_index::IndexConfig;
//! use tilearc_index::archive::{ArchiveWriter, EntryCompression};
//! use tilearc_index::index::IndexBuilder;
//! use std::io::Cursor;
//!
//! let config = IndexConfig::default();
//! let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()));
//! writer.add_file("tileset.json", br#"{"asset":{"version":"1.0"}}"#, EntryCompression::Deflated)?;
//! writer.add_file("tiles/0.b3dm", b"b3dm", EntryCompression::Stored)?;
//!
//! let mut builder = IndexBuilder::new(&config);
//! builder.extend_from_listing(writer.listing());
//! let (index, _) = builder.finish()?;
//!
//! let archive = writer.finish_with_index(&index, &config, EntryCompression::Stored)?;
//! assert!(!archive.into_inner().is_empty());
//! # Ok::<(), tilearc_index::IndexError>(())
//! ```

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::{DirectoryEntry, SortedIndex};
use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::borrow::Cow;
use std::io::Write;
use tracing::debug;

use super::constants::{
    METHOD_DEFLATED, METHOD_STORED, VERSION_DEFAULT, VERSION_ZIP64, ZIP64_END_RECORD_SIZE,
    ZIP64_SENTINEL, ZIP64_SENTINEL_16,
};
use super::headers::{
    CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader, Zip64EndLocator,
    Zip64EndRecord, Zip64ExtendedInfo, encode,
};

/// DOS date for 1980-01-01, the earliest representable date
const DOS_EPOCH_DATE: u16 = (1 << 5) | 1;

/// MS-DOS directory attribute
const DIRECTORY_ATTRIBUTE: u32 = 0x10;

/// How an entry's data is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryCompression {
    /// Data is stored as is
    #[default]
    Stored,
    /// Data is raw deflate compressed
    Deflated,
}

impl EntryCompression {
    /// Zip compression method number
    pub const fn method(self) -> u16 {
        match self {
            Self::Stored => METHOD_STORED,
            Self::Deflated => METHOD_DEFLATED,
        }
    }
}

/// Sequential zip writer
pub struct ArchiveWriter<W: Write> {
    /// Underlying writer
    writer: W,
    /// Current write position
    position: u64,
    /// Central directory headers in entry order
    headers: Vec<CentralDirectoryHeader>,
    /// Store every local header offset in a zip64 extra field
    force_zip64: bool,
    /// Extra field written into every local header
    local_extra: Vec<u8>,
    /// Archive comment
    comment: Vec<u8>,
}

impl<W: Write> ArchiveWriter<W> {
    /// Create a writer starting at offset 0 of `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            position: 0,
            headers: Vec::new(),
            force_zip64: false,
            local_extra: Vec::new(),
            comment: Vec::new(),
        }
    }

    /// Always use zip64 offsets and end records, even for small archives
    #[must_use]
    pub fn with_zip64(mut self, force: bool) -> Self {
        self.force_zip64 = force;
        self
    }

    /// Add the same extra field to every local header
    #[must_use]
    pub fn with_local_extra(mut self, extra: Vec<u8>) -> Self {
        self.local_extra = extra;
        self
    }

    /// Set the archive comment
    #[must_use]
    pub fn with_comment(mut self, comment: Vec<u8>) -> Self {
        self.comment = comment;
        self
    }

    /// Current write position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Check if no entries have been written
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Add a file entry, returning the offset of its local header
    pub fn add_file(
        &mut self,
        name: &str,
        data: &[u8],
        compression: EntryCompression,
    ) -> IndexResult<u64> {
        let mut crc = Crc::new();
        crc.update(data);

        let payload: Cow<'_, [u8]> = match compression {
            EntryCompression::Stored => Cow::Borrowed(data),
            EntryCompression::Deflated => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                Cow::Owned(encoder.finish()?)
            }
        };

        self.add_entry(name, &payload, data.len(), crc.sum(), compression.method(), 0)
    }

    /// Add a directory marker; a trailing `/` is appended if missing
    pub fn add_directory(&mut self, name: &str) -> IndexResult<u64> {
        let name = if name.ends_with('/') {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(format!("{name}/"))
        };
        self.add_entry(&name, &[], 0, 0, METHOD_STORED, DIRECTORY_ATTRIBUTE)
    }

    fn add_entry(
        &mut self,
        name: &str,
        payload: &[u8],
        uncompressed_len: usize,
        crc32: u32,
        compression_method: u16,
        external_attributes: u32,
    ) -> IndexResult<u64> {
        let offset = self.position;
        let name_bytes = name.as_bytes().to_vec();
        let name_length = field_u16(name_bytes.len(), "entry name")?;
        let compressed_size = field_u32(payload.len(), "compressed entry")?;
        let uncompressed_size = field_u32(uncompressed_len, "entry")?;

        let local = LocalFileHeader {
            version_needed: VERSION_DEFAULT,
            flags: 0,
            compression_method,
            mod_time: 0,
            mod_date: DOS_EPOCH_DATE,
            crc32,
            compressed_size,
            uncompressed_size,
            name_length,
            extra_length: field_u16(self.local_extra.len(), "local extra field")?,
            name: name_bytes.clone(),
            extra: self.local_extra.clone(),
        };
        self.write_bytes(&encode(&local)?)?;
        self.write_bytes(payload)?;

        let zip64 = self.force_zip64 || offset >= u64::from(ZIP64_SENTINEL);
        let (local_header_offset, extra) = if zip64 {
            let info = Zip64ExtendedInfo {
                local_header_offset: Some(offset),
                ..Zip64ExtendedInfo::default()
            };
            (ZIP64_SENTINEL, info.to_bytes())
        } else {
            (offset as u32, Vec::new())
        };
        let version = if zip64 { VERSION_ZIP64 } else { VERSION_DEFAULT };

        self.headers.push(CentralDirectoryHeader {
            version_made_by: version,
            version_needed: version,
            flags: 0,
            compression_method,
            mod_time: 0,
            mod_date: DOS_EPOCH_DATE,
            crc32,
            compressed_size,
            uncompressed_size,
            name_length,
            extra_length: field_u16(extra.len(), "central extra field")?,
            comment_length: 0,
            disk_start: 0,
            internal_attributes: 0,
            external_attributes,
            local_header_offset,
            name: name_bytes,
            extra,
            comment: Vec::new(),
        });
        debug!("Wrote entry '{name}' at offset {offset} ({} bytes)", payload.len());
        Ok(offset)
    }

    /// Entries written so far as a listing for index building
    pub fn listing(&self) -> Vec<DirectoryEntry> {
        self.headers
            .iter()
            .map(|header| DirectoryEntry {
                path: header.file_name(),
                offset: header.resolved_local_header_offset().unwrap_or_default(),
                is_directory: header.is_directory(),
            })
            .collect()
    }

    /// Append `index` as the reserved final entry and finish the archive
    pub fn finish_with_index(
        mut self,
        index: &SortedIndex,
        config: &IndexConfig,
        compression: EntryCompression,
    ) -> IndexResult<W> {
        let blob = index.to_bytes()?;
        self.add_file(&config.reserved_entry, &blob, compression)?;
        self.finish()
    }

    /// Write the central directory and end records
    pub fn finish(mut self) -> IndexResult<W> {
        let directory_offset = self.position;
        let headers = std::mem::take(&mut self.headers);
        for header in &headers {
            self.write_bytes(&encode(header)?)?;
        }
        let directory_size = self.position - directory_offset;
        let count = headers.len() as u64;

        let zip64 = self.force_zip64
            || count >= u64::from(ZIP64_SENTINEL_16)
            || directory_offset >= u64::from(ZIP64_SENTINEL)
            || directory_size >= u64::from(ZIP64_SENTINEL);

        if zip64 {
            let record_offset = self.position;
            let record = Zip64EndRecord {
                record_size: (ZIP64_END_RECORD_SIZE - 12) as u64,
                version_made_by: VERSION_ZIP64,
                version_needed: VERSION_ZIP64,
                disk_number: 0,
                central_directory_disk: 0,
                entries_on_disk: count,
                total_entries: count,
                central_directory_size: directory_size,
                central_directory_offset: directory_offset,
            };
            self.write_bytes(&encode(&record)?)?;
            let locator = Zip64EndLocator {
                record_disk: 0,
                record_offset,
                total_disks: 1,
            };
            self.write_bytes(&encode(&locator)?)?;
        }

        let end_record = EndOfCentralDirectory {
            disk_number: 0,
            central_directory_disk: 0,
            entries_on_disk: if zip64 { ZIP64_SENTINEL_16 } else { count as u16 },
            total_entries: if zip64 { ZIP64_SENTINEL_16 } else { count as u16 },
            central_directory_size: if zip64 { ZIP64_SENTINEL } else { directory_size as u32 },
            central_directory_offset: if zip64 { ZIP64_SENTINEL } else { directory_offset as u32 },
            comment_length: field_u16(self.comment.len(), "archive comment")?,
            comment: std::mem::take(&mut self.comment),
        };
        self.write_bytes(&encode(&end_record)?)?;
        self.writer.flush()?;

        debug!(
            "Finished archive: {count} entries, central directory at {directory_offset} ({directory_size} bytes){}",
            if zip64 { ", zip64" } else { "" }
        );
        Ok(self.writer)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> IndexResult<()> {
        self.writer.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }
}

fn field_u16(len: usize, what: &str) -> IndexResult<u16> {
    u16::try_from(len).map_err(|_| {
        IndexError::central_directory(format!("{what} of {len} bytes exceeds a 16-bit length"))
    })
}

fn field_u32(len: usize, what: &str) -> IndexResult<u32> {
    u32::try_from(len)
        .ok()
        .filter(|&n| n != ZIP64_SENTINEL)
        .ok_or_else(|| {
            IndexError::central_directory(format!(
                "{what} of {len} bytes needs zip64 sizes, which the writer does not produce"
            ))
        })
}
