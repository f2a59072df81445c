//! Recovering the embedded index from the tail of an archive
//!
//! The embedded index is always the last entry of the central directory, so
//! only the archive trailer is needed to find it:
//!
//! 1. Read a trailing window and scan it backward for the end of central
//!    directory record and the last central directory header.
//! 2. Parse that header (resolving zip64 fields from its extra field).
//! 3. Read the local header at the resolved offset together with the data.
//!
//! The window starts small and doubles up to the configured cap when the
//! records do not fit, which covers archives with long comments.

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult, describe_decode_error};
use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

use super::constants::{
    CENTRAL_DIRECTORY_HEADER_SIGNATURE, END_OF_CENTRAL_DIRECTORY_SIZE, LOCAL_FILE_HEADER_SIGNATURE,
    LOCAL_FILE_HEADER_SIZE, METHOD_DEFLATED, METHOD_STORED, ZIP64_END_LOCATOR_SIGNATURE,
    ZIP64_END_LOCATOR_SIZE,
};
use super::headers::{
    CentralDirectoryHeader, LocalFileHeader, Zip64EndLocator, decode,
    find_end_of_central_directory, read_at, rfind_signature,
};

/// Raw embedded index entry as stored in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedIndex {
    /// Entry name
    pub name: String,
    /// Offset of the entry's local header
    pub local_header_offset: u64,
    /// Compression method from the central directory
    pub compression_method: u16,
    /// CRC-32 of the uncompressed blob
    pub crc32: u32,
    /// Uncompressed size from the central directory
    pub uncompressed_size: u64,
    /// Entry data exactly as stored
    pub data: Vec<u8>,
}

impl EmbeddedIndex {
    /// Undo the entry's compression and return the index blob
    ///
    /// Stored entries pass through; deflated entries are inflated, never past
    /// one byte more than the recorded uncompressed size. The length and CRC
    /// from the central directory are checked either way.
    pub fn into_blob(self) -> IndexResult<Vec<u8>> {
        let blob = match self.compression_method {
            METHOD_STORED => self.data,
            METHOD_DEFLATED => {
                let mut inflated = Vec::with_capacity(self.capacity_hint());
                DeflateDecoder::new(self.data.as_slice())
                    .take(self.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut inflated)?;
                debug!(
                    "Inflated embedded index from {} to {} bytes",
                    self.data.len(),
                    inflated.len()
                );
                inflated
            }
            other => return Err(IndexError::UnsupportedCompression(other)),
        };

        if blob.len() as u64 != self.uncompressed_size {
            return Err(IndexError::local_header(
                self.local_header_offset,
                format!(
                    "entry holds {} bytes but the central directory records {}",
                    blob.len(),
                    self.uncompressed_size
                ),
            ));
        }

        let mut crc = Crc::new();
        crc.update(&blob);
        if crc.sum() != self.crc32 {
            return Err(IndexError::local_header(
                self.local_header_offset,
                format!(
                    "CRC mismatch: expected {:08x}, computed {:08x}",
                    self.crc32,
                    crc.sum()
                ),
            ));
        }
        Ok(blob)
    }

    // The recorded size is untrusted, so it only bounds the guess
    fn capacity_hint(&self) -> usize {
        usize::try_from(self.uncompressed_size)
            .unwrap_or(usize::MAX)
            .min(self.data.len().saturating_mul(INFLATE_CAPACITY_FACTOR))
    }
}

/// Largest initial buffer for inflation, as a multiple of the deflated size
const INFLATE_CAPACITY_FACTOR: usize = 4;

/// Reads the embedded index entry from the trailer of an archive
#[derive(Debug, Clone, Copy)]
pub struct ArchiveBootstrap<'a> {
    config: &'a IndexConfig,
}

impl<'a> ArchiveBootstrap<'a> {
    /// Create a bootstrap parser with the given configuration
    pub fn new(config: &'a IndexConfig) -> Self {
        Self { config }
    }

    /// Open an archive on disk and extract its embedded index entry
    pub fn open<P: AsRef<Path>>(&self, path: P) -> IndexResult<EmbeddedIndex> {
        self.extract(File::open(path)?)
    }

    /// Extract the embedded index entry from a random-access reader
    pub fn extract<R: Read + Seek>(&self, mut reader: R) -> IndexResult<EmbeddedIndex> {
        let archive_len = reader.seek(SeekFrom::End(0))?;
        if archive_len < END_OF_CENTRAL_DIRECTORY_SIZE as u64 {
            return Err(IndexError::central_directory(format!(
                "archive is only {archive_len} bytes"
            )));
        }

        let header = self.locate_index_header(&mut reader, archive_len)?;
        let name = header.file_name();
        if !self.config.is_reserved(&name) {
            return Err(IndexError::central_directory(format!(
                "last central directory entry '{name}' is not an embedded index"
            )));
        }

        let offset = header.resolved_local_header_offset().ok_or_else(|| {
            IndexError::central_directory("zip64 local header offset missing from extra field")
        })?;
        let compressed_size = header.resolved_compressed_size().ok_or_else(|| {
            IndexError::central_directory("zip64 compressed size missing from extra field")
        })?;
        let uncompressed_size = header.resolved_uncompressed_size().ok_or_else(|| {
            IndexError::central_directory("zip64 uncompressed size missing from extra field")
        })?;
        debug!(
            "Embedded index '{name}' at offset {offset}, {compressed_size} bytes (method {})",
            header.compression_method
        );

        let data = self.read_entry_data(&mut reader, archive_len, &header, offset, compressed_size)?;
        Ok(EmbeddedIndex {
            name,
            local_header_offset: offset,
            compression_method: header.compression_method,
            crc32: header.crc32,
            uncompressed_size,
            data,
        })
    }

    fn locate_index_header<R: Read + Seek>(
        &self,
        reader: &mut R,
        archive_len: u64,
    ) -> IndexResult<CentralDirectoryHeader> {
        let limit = clamp_to_archive(
            self.config
                .max_trailer_window
                .max(END_OF_CENTRAL_DIRECTORY_SIZE),
            archive_len,
        );
        let mut window_len = clamp_to_archive(
            self.config.trailer_window.max(END_OF_CENTRAL_DIRECTORY_SIZE),
            archive_len,
        )
        .min(limit);

        loop {
            let window_start = archive_len - window_len as u64;
            let window = read_at(reader, window_start, window_len)?;
            let at_limit = window_len >= limit;

            if let Some(header) = scan_window(&window, window_start, at_limit)? {
                return Ok(header);
            }
            if at_limit {
                return Err(IndexError::central_directory(format!(
                    "no central directory header in the trailing {window_len} bytes"
                )));
            }

            let grown = window_len.saturating_mul(2).min(limit);
            debug!("Growing trailing window from {window_len} to {grown} bytes");
            window_len = grown;
        }
    }

    fn read_entry_data<R: Read + Seek>(
        &self,
        reader: &mut R,
        archive_len: u64,
        header: &CentralDirectoryHeader,
        offset: u64,
        compressed_size: u64,
    ) -> IndexResult<Vec<u8>> {
        let available = archive_len.checked_sub(offset).filter(|&n| n > 0).ok_or_else(|| {
            IndexError::local_header(offset, "offset lies past the end of the archive")
        })?;

        if compressed_size > available {
            return Err(IndexError::local_header(
                offset,
                format!("compressed size {compressed_size} runs past the end of the archive"),
            ));
        }

        // Saturating; the read is clamped to the archive
        let wanted = (LOCAL_FILE_HEADER_SIZE as u64 + u64::from(header.name_length))
            .saturating_add(u64::try_from(self.config.local_header_slack).unwrap_or(u64::MAX))
            .saturating_add(compressed_size);
        let mut buffer = read_at(reader, offset, to_usize(wanted.min(available), offset)?)?;

        if buffer.len() < LOCAL_FILE_HEADER_SIZE
            || buffer[..4] != LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes()
        {
            return Err(IndexError::local_header(offset, "bad local file header signature"));
        }
        let (name_len, extra_len) = LocalFileHeader::variable_lengths(&buffer)
            .ok_or_else(|| IndexError::local_header(offset, "truncated local file header"))?;

        let data_start = LOCAL_FILE_HEADER_SIZE + name_len + extra_len;
        let data_end = (data_start as u64)
            .checked_add(compressed_size)
            .filter(|&end| end <= available)
            .ok_or_else(|| {
                IndexError::local_header(offset, "entry data runs past the end of the archive")
            })?;
        let data_end = to_usize(data_end, offset)?;
        if data_end > buffer.len() {
            let missing = data_end - buffer.len();
            debug!("Local extra field of {extra_len} bytes exceeds slack; reading {missing} more bytes");
            let rest = read_at(reader, offset + buffer.len() as u64, missing)?;
            buffer.extend_from_slice(&rest);
        }

        let local: LocalFileHeader = decode(&buffer).map_err(|e| {
            IndexError::local_header(
                offset,
                format!("unreadable header: {}", describe_decode_error(&e)),
            )
        })?;
        if local.name != header.name {
            return Err(IndexError::local_header(
                offset,
                format!(
                    "name '{}' does not match central directory",
                    String::from_utf8_lossy(&local.name)
                ),
            ));
        }

        buffer.truncate(data_end);
        Ok(buffer.split_off(data_start))
    }
}

/// Find and parse the last central directory header inside one window
///
/// Returns `Ok(None)` when the window is too small to decide.
fn scan_window(
    window: &[u8],
    window_start: u64,
    at_limit: bool,
) -> IndexResult<Option<CentralDirectoryHeader>> {
    let end_record = find_end_of_central_directory(window);

    let directory_end = match end_record {
        Some(position) if position < ZIP64_END_LOCATOR_SIZE && window_start > 0 && !at_limit => {
            // The zip64 locator, if any, lies before the window
            return Ok(None);
        }
        Some(position) => central_directory_end(window, position, window_start),
        None if !at_limit => return Ok(None),
        None => window.len(),
    };

    // Header signature bytes can also appear inside a header's own fields,
    // so walk back until a candidate ends exactly where the directory ends
    let mut last_candidate = None;
    let mut search_end = directory_end;
    while let Some(position) =
        rfind_signature(&window[..search_end], CENTRAL_DIRECTORY_HEADER_SIGNATURE)
    {
        last_candidate.get_or_insert(position);
        if let Ok(header) = decode::<CentralDirectoryHeader>(&window[position..directory_end]) {
            if position + header.total_size() == directory_end {
                debug!(
                    "Last central directory header at archive offset {}",
                    window_start + position as u64
                );
                return Ok(Some(header));
            }
        }
        search_end = position;
    }

    let Some(position) = last_candidate else {
        return Ok(None);
    };
    if window_start > 0 && !at_limit {
        // The matching header may start before the window
        return Ok(None);
    }

    if end_record.is_some() {
        warn!(
            "Central directory end does not match the header at archive offset {}; reading the raw window",
            window_start + position as u64
        );
    } else {
        warn!("No end of central directory record found; reading the raw window");
    }

    decode::<CentralDirectoryHeader>(&window[position..])
        .map(Some)
        .map_err(|e| {
            IndexError::central_directory(format!(
                "unreadable header at archive offset {}: {}",
                window_start + position as u64,
                describe_decode_error(&e)
            ))
        })
}

/// Window position where the central directory ends
///
/// That is the zip64 end record when a locator precedes the end record, and
/// the end record itself otherwise. A zip64 record before the window maps to
/// position 0 so the header scan comes up empty and the window grows.
fn central_directory_end(window: &[u8], end_record: usize, window_start: u64) -> usize {
    let Some(locator_start) = end_record.checked_sub(ZIP64_END_LOCATOR_SIZE) else {
        return end_record;
    };
    let locator_bytes = &window[locator_start..end_record];
    if locator_bytes[..4] != ZIP64_END_LOCATOR_SIGNATURE.to_le_bytes() {
        return end_record;
    }
    match decode::<Zip64EndLocator>(locator_bytes) {
        Ok(locator) => {
            debug!("Zip64 end record at archive offset {}", locator.record_offset);
            locator
                .record_offset
                .checked_sub(window_start)
                .and_then(|p| usize::try_from(p).ok())
                .filter(|&p| p <= locator_start)
                .unwrap_or(0)
        }
        Err(_) => end_record,
    }
}

fn clamp_to_archive(size: usize, archive_len: u64) -> usize {
    usize::try_from(archive_len).map_or(size, |len| size.min(len))
}

fn to_usize(value: u64, offset: u64) -> IndexResult<usize> {
    usize::try_from(value)
        .map_err(|_| IndexError::local_header(offset, "entry too large to read into memory"))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::archive::constants::ZIP64_SENTINEL;
    use crate::archive::headers::{EndOfCentralDirectory, Zip64ExtendedInfo, encode};
    use crate::archive::{ArchiveWriter, EntryCompression};
    use crate::index::{IndexBuilder, SortedIndex};
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    const PATHS: [&str; 5] = ["a", "b", "tileset.json", "c/d", "e"];
    const RESERVED: &str = "@3dtilesIndex1@";

    /// Single stored entry under the reserved name, with its central
    /// directory header adjusted by `edit`
    fn hand_built(data: &[u8], edit: impl FnOnce(&mut CentralDirectoryHeader)) -> Vec<u8> {
        let name = RESERVED.as_bytes().to_vec();
        let mut crc = Crc::new();
        crc.update(data);

        let local = LocalFileHeader {
            version_needed: 20,
            flags: 0,
            compression_method: METHOD_STORED,
            mod_time: 0,
            mod_date: 33,
            crc32: crc.sum(),
            compressed_size: data.len() as u32,
            uncompressed_size: data.len() as u32,
            name_length: name.len() as u16,
            extra_length: 0,
            name: name.clone(),
            extra: Vec::new(),
        };
        let mut archive = encode(&local).unwrap();
        archive.extend_from_slice(data);

        let mut header = CentralDirectoryHeader {
            version_made_by: 20,
            version_needed: 20,
            flags: 0,
            compression_method: METHOD_STORED,
            mod_time: 0,
            mod_date: 33,
            crc32: crc.sum(),
            compressed_size: data.len() as u32,
            uncompressed_size: data.len() as u32,
            name_length: name.len() as u16,
            extra_length: 0,
            comment_length: 0,
            disk_start: 0,
            internal_attributes: 0,
            external_attributes: 0,
            local_header_offset: 0,
            name,
            extra: Vec::new(),
            comment: Vec::new(),
        };
        edit(&mut header);
        header.extra_length = header.extra.len() as u16;

        let directory_offset = archive.len() as u32;
        let directory = encode(&header).unwrap();
        archive.extend_from_slice(&directory);
        let end = EndOfCentralDirectory {
            disk_number: 0,
            central_directory_disk: 0,
            entries_on_disk: 1,
            total_entries: 1,
            central_directory_size: directory.len() as u32,
            central_directory_offset: directory_offset,
            comment_length: 0,
            comment: Vec::new(),
        };
        archive.extend_from_slice(&encode(&end).unwrap());
        archive
    }

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn packed_archive(
        writer: ArchiveWriter<Cursor<Vec<u8>>>,
        compression: EntryCompression,
    ) -> (Vec<u8>, SortedIndex) {
        let config = IndexConfig::default();
        let mut writer = writer;
        for path in PATHS {
            writer
                .add_file(path, path.repeat(40).as_bytes(), EntryCompression::Stored)
                .expect("add");
        }
        let mut builder = IndexBuilder::new(&config);
        builder.extend_from_listing(writer.listing());
        let (index, _) = builder.finish().expect("build");

        let archive = writer
            .finish_with_index(&index, &config, compression)
            .expect("finish")
            .into_inner();
        (archive, index)
    }

    fn extract(archive: &[u8], config: &IndexConfig) -> IndexResult<EmbeddedIndex> {
        ArchiveBootstrap::new(config).extract(Cursor::new(archive))
    }

    #[test]
    fn test_recovers_index_with_32bit_offsets() {
        let (archive, index) = packed_archive(
            ArchiveWriter::new(Cursor::new(Vec::new())),
            EntryCompression::Stored,
        );
        let embedded = extract(&archive, &IndexConfig::default()).expect("extract");

        assert_eq!(embedded.name, "@3dtilesIndex1@");
        assert_eq!(embedded.into_blob().expect("blob"), index.to_bytes().expect("encode"));
    }

    #[test]
    fn test_recovers_index_with_zip64_offsets() {
        let (archive, index) = packed_archive(
            ArchiveWriter::new(Cursor::new(Vec::new())).with_zip64(true),
            EntryCompression::Stored,
        );
        let embedded = extract(&archive, &IndexConfig::default()).expect("extract");

        assert!(rfind_signature(&archive, ZIP64_END_LOCATOR_SIGNATURE).is_some());
        assert_eq!(embedded.into_blob().expect("blob"), index.to_bytes().expect("encode"));
    }

    #[test]
    fn test_recovers_deflated_index() {
        let (archive, index) = packed_archive(
            ArchiveWriter::new(Cursor::new(Vec::new())),
            EntryCompression::Deflated,
        );
        let embedded = extract(&archive, &IndexConfig::default()).expect("extract");
        assert_eq!(embedded.compression_method, METHOD_DEFLATED);

        let blob = embedded.into_blob().expect("inflate");
        assert_eq!(SortedIndex::from_bytes(&blob).expect("decode"), index);
    }

    #[test]
    fn test_window_grows_past_long_comment() {
        let (archive, index) = packed_archive(
            ArchiveWriter::new(Cursor::new(Vec::new())).with_comment(vec![b'#'; 5000]),
            EntryCompression::Stored,
        );
        let config = IndexConfig::default().with_trailer_window(64);
        let embedded = extract(&archive, &config).expect("extract");
        assert_eq!(embedded.into_blob().expect("blob"), index.to_bytes().expect("encode"));

        let capped = IndexConfig {
            max_trailer_window: 128,
            ..config
        };
        assert!(matches!(
            extract(&archive, &capped),
            Err(IndexError::CorruptCentralDirectory { .. })
        ));
    }

    #[test]
    fn test_local_extra_field_larger_than_slack() {
        let (archive, index) = packed_archive(
            ArchiveWriter::new(Cursor::new(Vec::new())).with_local_extra(vec![0u8; 300]),
            EntryCompression::Stored,
        );
        let config = IndexConfig::default().with_local_header_slack(8);
        let embedded = extract(&archive, &config).expect("extract");
        assert_eq!(embedded.into_blob().expect("blob"), index.to_bytes().expect("encode"));
    }

    #[test]
    fn test_corrupt_local_header_signature() {
        let (mut archive, _) = packed_archive(
            ArchiveWriter::new(Cursor::new(Vec::new())),
            EntryCompression::Stored,
        );
        let offset = extract(&archive, &IndexConfig::default())
            .expect("extract")
            .local_header_offset as usize;
        archive[offset] = b'X';

        assert!(matches!(
            extract(&archive, &IndexConfig::default()),
            Err(IndexError::CorruptLocalHeader { offset: o, .. }) if o == offset as u64
        ));
    }

    #[test]
    fn test_archive_without_embedded_index() {
        let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()));
        writer
            .add_file("tileset.json", b"{}", EntryCompression::Stored)
            .expect("add");
        let archive = writer.finish().expect("finish").into_inner();

        assert!(matches!(
            extract(&archive, &IndexConfig::default()),
            Err(IndexError::CorruptCentralDirectory { .. })
        ));
    }

    #[test]
    fn test_tiny_and_garbage_inputs() {
        assert!(matches!(
            extract(b"PK", &IndexConfig::default()),
            Err(IndexError::CorruptCentralDirectory { .. })
        ));
        assert!(matches!(
            extract(&[0u8; 4096], &IndexConfig::default()),
            Err(IndexError::CorruptCentralDirectory { .. })
        ));
    }

    #[test]
    fn test_unsupported_method() {
        let embedded = EmbeddedIndex {
            name: "@3dtilesIndex1@".into(),
            local_header_offset: 0,
            compression_method: 12,
            crc32: 0,
            uncompressed_size: 0,
            data: Vec::new(),
        };
        assert!(matches!(
            embedded.into_blob(),
            Err(IndexError::UnsupportedCompression(12))
        ));
    }

    #[test]
    fn test_oversized_compressed_size_is_an_error() {
        let huge = hand_built(&[0u8; 48], |header| {
            header.compressed_size = ZIP64_SENTINEL;
            header.extra = Zip64ExtendedInfo {
                compressed_size: Some(u64::MAX - 5),
                ..Zip64ExtendedInfo::default()
            }
            .to_bytes();
        });
        assert!(matches!(
            extract(&huge, &IndexConfig::default()),
            Err(IndexError::CorruptLocalHeader { offset: 0, .. })
        ));

        // Fits in the archive, but not once the local header is added
        let overlong = hand_built(&[0u8; 48], |header| header.compressed_size = 150);
        assert!(matches!(
            extract(&overlong, &IndexConfig::default()),
            Err(IndexError::CorruptLocalHeader { offset: 0, .. })
        ));
    }

    #[test]
    fn test_unbounded_slack_is_clamped() {
        let archive = hand_built(b"index bytes", |_| {});
        let config = IndexConfig::default().with_local_header_slack(usize::MAX);
        let embedded = extract(&archive, &config).expect("extract");
        assert_eq!(embedded.data, b"index bytes");
    }

    #[test]
    fn test_inflation_stops_at_recorded_size() {
        let blob = vec![7u8; 24 * 8];
        let mut crc = Crc::new();
        crc.update(&blob);
        let checksum = crc.sum();
        let embedded = |uncompressed_size: u64| EmbeddedIndex {
            name: RESERVED.into(),
            local_header_offset: 0,
            compression_method: METHOD_DEFLATED,
            crc32: checksum,
            uncompressed_size,
            data: deflate(&blob),
        };

        assert_eq!(embedded(blob.len() as u64).into_blob().expect("inflate"), blob);
        assert!(matches!(
            embedded(1 << 62).into_blob(),
            Err(IndexError::CorruptLocalHeader { .. })
        ));
        assert!(matches!(
            embedded(24).into_blob(),
            Err(IndexError::CorruptLocalHeader { .. })
        ));
    }

    #[test]
    fn test_signature_bytes_inside_header_fields() {
        let archive = hand_built(b"index bytes", |header| {
            header.crc32 = CENTRAL_DIRECTORY_HEADER_SIGNATURE;
        });
        let embedded = extract(&archive, &IndexConfig::default()).expect("extract");
        assert_eq!(embedded.name, RESERVED);
        assert_eq!(embedded.local_header_offset, 0);
        assert_eq!(embedded.data, b"index bytes");
    }

    #[test]
    fn test_directory_end_mismatch_reads_raw_window() {
        let (mut archive, index) = packed_archive(
            ArchiveWriter::new(Cursor::new(Vec::new())),
            EntryCompression::Stored,
        );
        // Junk between the last header and the end record
        let end = archive.len() - END_OF_CENTRAL_DIRECTORY_SIZE;
        archive.splice(end..end, [0xAA; 7]);

        let embedded = extract(&archive, &IndexConfig::default()).expect("extract");
        assert_eq!(embedded.into_blob().expect("blob"), index.to_bytes().expect("encode"));
    }

    #[test]
    fn test_missing_end_record_reads_raw_window() {
        let (mut archive, index) = packed_archive(
            ArchiveWriter::new(Cursor::new(Vec::new())),
            EntryCompression::Stored,
        );
        archive.truncate(archive.len() - END_OF_CENTRAL_DIRECTORY_SIZE);
        let embedded = extract(&archive, &IndexConfig::default()).expect("extract");
        assert_eq!(embedded.data, index.to_bytes().expect("encode"));

        archive.extend_from_slice(&[0xAA; 5]);
        let embedded = extract(&archive, &IndexConfig::default()).expect("extract");
        assert_eq!(embedded.data, index.to_bytes().expect("encode"));

        // Raw window too short for the header it starts with
        let last = rfind_signature(&archive, CENTRAL_DIRECTORY_HEADER_SIGNATURE).expect("header");
        archive.truncate(last + 20);
        let message = extract(&archive, &IndexConfig::default())
            .expect_err("truncated header")
            .to_string();
        assert!(message.starts_with("Corrupt central directory"), "{message}");
        assert!(message.contains("record is truncated"), "{message}");
        assert!(!message.contains('\u{1b}'));
    }
}
