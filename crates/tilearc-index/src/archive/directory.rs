//! Full central directory listing
//!
//! Enumerates every entry of an archive, which is what index building and
//! repair consume. Unlike the bootstrap parser this reads the whole central
//! directory, located through the end record (or the zip64 end record).

use crate::error::{IndexError, IndexResult, describe_decode_error};
use crate::index::DirectoryEntry;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::constants::{
    CENTRAL_DIRECTORY_HEADER_SIZE, END_OF_CENTRAL_DIRECTORY_SIZE, MAX_VARIABLE_FIELD,
    ZIP64_END_LOCATOR_SIGNATURE, ZIP64_END_LOCATOR_SIZE, ZIP64_END_RECORD_SIZE,
};
use super::headers::{
    CentralDirectoryHeader, EndOfCentralDirectory, Zip64EndLocator, Zip64EndRecord, decode,
    find_end_of_central_directory, read_at,
};

/// One archive entry with zip64 fields resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Entry path as stored
    pub name: String,
    /// Compression method
    pub compression_method: u16,
    /// CRC-32 of the uncompressed data
    pub crc32: u32,
    /// Compressed size in bytes
    pub compressed_size: u64,
    /// Uncompressed size in bytes
    pub uncompressed_size: u64,
    /// Offset of the local header
    pub local_header_offset: u64,
}

impl ArchiveEntry {
    fn from_header(header: &CentralDirectoryHeader) -> IndexResult<Self> {
        let name = header.file_name();
        let missing =
            |field: &str| IndexError::central_directory(format!("{name}: zip64 {field} missing"));
        Ok(Self {
            compression_method: header.compression_method,
            crc32: header.crc32,
            compressed_size: header
                .resolved_compressed_size()
                .ok_or_else(|| missing("compressed size"))?,
            uncompressed_size: header
                .resolved_uncompressed_size()
                .ok_or_else(|| missing("uncompressed size"))?,
            local_header_offset: header
                .resolved_local_header_offset()
                .ok_or_else(|| missing("local header offset"))?,
            name,
        })
    }

    /// Whether the entry is a directory marker
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }
}

impl From<&ArchiveEntry> for DirectoryEntry {
    fn from(entry: &ArchiveEntry) -> Self {
        Self {
            path: entry.name.clone(),
            offset: entry.local_header_offset,
            is_directory: entry.is_directory(),
        }
    }
}

/// All entries of an archive's central directory, in directory order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CentralDirectory {
    entries: Vec<ArchiveEntry>,
    comment: Vec<u8>,
}

impl CentralDirectory {
    /// Read the central directory of an archive on disk
    pub fn open<P: AsRef<Path>>(path: P) -> IndexResult<Self> {
        let path = path.as_ref();
        let started = Instant::now();
        let directory = Self::read(BufReader::new(File::open(path)?))?;
        info!(
            "Read {} entries from {} in {:?}",
            directory.len(),
            path.display(),
            started.elapsed()
        );
        Ok(directory)
    }

    /// Read the central directory from a random-access reader
    pub fn read<R: Read + Seek>(mut reader: R) -> IndexResult<Self> {
        let archive_len = reader.seek(SeekFrom::End(0))?;
        if archive_len < END_OF_CENTRAL_DIRECTORY_SIZE as u64 {
            return Err(IndexError::central_directory(format!(
                "archive is only {archive_len} bytes"
            )));
        }

        let tail_len = usize::try_from(archive_len).unwrap_or(usize::MAX).min(
            END_OF_CENTRAL_DIRECTORY_SIZE + MAX_VARIABLE_FIELD + ZIP64_END_LOCATOR_SIZE,
        );
        let tail_start = archive_len - tail_len as u64;
        let tail = read_at(&mut reader, tail_start, tail_len)?;

        let end_position = find_end_of_central_directory(&tail)
            .ok_or_else(|| IndexError::central_directory("end of central directory not found"))?;
        let end_record: EndOfCentralDirectory = decode(&tail[end_position..]).map_err(|e| {
            IndexError::central_directory(format!(
                "unreadable end record: {}",
                describe_decode_error(&e)
            ))
        })?;

        let (offset, size, count) = match zip64_locator(&tail, end_position) {
            Some(locator) => {
                let record = read_at(&mut reader, locator.record_offset, ZIP64_END_RECORD_SIZE)?;
                let record: Zip64EndRecord = decode(&record).map_err(|e| {
                    IndexError::central_directory(format!(
                        "unreadable zip64 end record: {}",
                        describe_decode_error(&e)
                    ))
                })?;
                debug!(
                    "Zip64 central directory: {} entries at offset {}",
                    record.total_entries, record.central_directory_offset
                );
                (
                    record.central_directory_offset,
                    record.central_directory_size,
                    record.total_entries,
                )
            }
            None if end_record.needs_zip64() => {
                return Err(IndexError::central_directory(
                    "end record defers to a zip64 record but no locator is present",
                ));
            }
            None => (
                u64::from(end_record.central_directory_offset),
                u64::from(end_record.central_directory_size),
                u64::from(end_record.total_entries),
            ),
        };

        if offset.checked_add(size).is_none_or(|end| end > archive_len) {
            return Err(IndexError::central_directory(format!(
                "central directory at {offset} with {size} bytes exceeds archive length {archive_len}"
            )));
        }
        let size = usize::try_from(size)
            .map_err(|_| IndexError::central_directory("central directory too large"))?;
        let data = read_at(&mut reader, offset, size)?;

        let capacity = usize::try_from(count)
            .unwrap_or(0)
            .min(size / CENTRAL_DIRECTORY_HEADER_SIZE + 1);
        let mut entries = Vec::with_capacity(capacity);
        let mut position = 0;
        for i in 0..count {
            let header: CentralDirectoryHeader = decode(&data[position..]).map_err(|e| {
                IndexError::central_directory(format!(
                    "entry {i} at directory offset {position}: {}",
                    describe_decode_error(&e)
                ))
            })?;
            position += header.total_size();
            entries.push(ArchiveEntry::from_header(&header)?);
        }

        Ok(Self {
            entries,
            comment: end_record.comment,
        })
    }

    /// Entries in directory order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Archive comment
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    /// Entry with an exact name
    pub fn find(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Entries as a listing for index building and repair
    pub fn listing(&self) -> Vec<DirectoryEntry> {
        self.entries.iter().map(DirectoryEntry::from).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn zip64_locator(tail: &[u8], end_position: usize) -> Option<Zip64EndLocator> {
    let start = end_position.checked_sub(ZIP64_END_LOCATOR_SIZE)?;
    let bytes = &tail[start..end_position];
    if bytes[..4] != ZIP64_END_LOCATOR_SIGNATURE.to_le_bytes() {
        return None;
    }
    decode(bytes).ok()
}
