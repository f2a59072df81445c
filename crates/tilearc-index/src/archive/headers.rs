//! Zip record layouts shared by the bootstrap parser, lister and writer
//!
//! All records are little-endian. Variable-length tails (names, extra fields,
//! comments) are read with the lengths from the fixed part, so a buffer that
//! is too short fails the read instead of yielding a short field.

use binrw::{BinRead, BinResult, BinWrite, Endian};
use std::io::{Cursor, Read, Seek, SeekFrom};

use super::constants::{
    CENTRAL_DIRECTORY_HEADER_SIZE, END_OF_CENTRAL_DIRECTORY_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_SIZE, LOCAL_FILE_HEADER_SIZE, ZIP64_EXTRA_TAG, ZIP64_SENTINEL,
    ZIP64_SENTINEL_16,
};

/// End of central directory record
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = 0x0605_4b50_u32)]
pub struct EndOfCentralDirectory {
    /// Number of this disk
    pub disk_number: u16,
    /// Disk where the central directory starts
    pub central_directory_disk: u16,
    /// Central directory entries on this disk
    pub entries_on_disk: u16,
    /// Total central directory entries
    pub total_entries: u16,
    /// Size of the central directory in bytes
    pub central_directory_size: u32,
    /// Offset of the central directory from the start of the archive
    pub central_directory_offset: u32,
    /// Length of the archive comment
    pub comment_length: u16,
    /// Archive comment
    #[br(count = usize::from(comment_length))]
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Whether any field defers to the zip64 end record
    pub fn needs_zip64(&self) -> bool {
        self.entries_on_disk == ZIP64_SENTINEL_16
            || self.total_entries == ZIP64_SENTINEL_16
            || self.central_directory_size == ZIP64_SENTINEL
            || self.central_directory_offset == ZIP64_SENTINEL
    }
}

/// Zip64 end of central directory locator
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = 0x0706_4b50_u32)]
pub struct Zip64EndLocator {
    /// Disk holding the zip64 end record
    pub record_disk: u32,
    /// Absolute offset of the zip64 end record
    pub record_offset: u64,
    /// Total number of disks
    pub total_disks: u32,
}

/// Zip64 end of central directory record (fixed part)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = 0x0606_4b50_u32)]
pub struct Zip64EndRecord {
    /// Size of the remaining record, excluding the signature and this field
    pub record_size: u64,
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version_needed: u16,
    /// Number of this disk
    pub disk_number: u32,
    /// Disk where the central directory starts
    pub central_directory_disk: u32,
    /// Central directory entries on this disk
    pub entries_on_disk: u64,
    /// Total central directory entries
    pub total_entries: u64,
    /// Size of the central directory in bytes
    pub central_directory_size: u64,
    /// Offset of the central directory from the start of the archive
    pub central_directory_offset: u64,
}

/// Central directory file header
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = 0x0201_4b50_u32)]
pub struct CentralDirectoryHeader {
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version_needed: u16,
    /// General purpose flags
    pub flags: u16,
    /// Compression method
    pub compression_method: u16,
    /// DOS modification time
    pub mod_time: u16,
    /// DOS modification date
    pub mod_date: u16,
    /// CRC-32 of the uncompressed data
    pub crc32: u32,
    /// Compressed size, or the zip64 sentinel
    pub compressed_size: u32,
    /// Uncompressed size, or the zip64 sentinel
    pub uncompressed_size: u32,
    /// Length of the entry name
    pub name_length: u16,
    /// Length of the extra field
    pub extra_length: u16,
    /// Length of the entry comment
    pub comment_length: u16,
    /// Disk where the entry starts
    pub disk_start: u16,
    /// Internal file attributes
    pub internal_attributes: u16,
    /// External file attributes
    pub external_attributes: u32,
    /// Offset of the local header, or the zip64 sentinel
    pub local_header_offset: u32,
    /// Entry name bytes
    #[br(count = usize::from(name_length))]
    pub name: Vec<u8>,
    /// Extra field bytes
    #[br(count = usize::from(extra_length))]
    pub extra: Vec<u8>,
    /// Entry comment bytes
    #[br(count = usize::from(comment_length))]
    pub comment: Vec<u8>,
}

impl CentralDirectoryHeader {
    /// Entry name, decoded lossily as UTF-8
    pub fn file_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// Whether the entry is a directory marker
    pub fn is_directory(&self) -> bool {
        self.name.last() == Some(&b'/')
    }

    /// Encoded size of the header including its variable parts
    pub fn total_size(&self) -> usize {
        CENTRAL_DIRECTORY_HEADER_SIZE + self.name.len() + self.extra.len() + self.comment.len()
    }

    /// Zip64 fields for every 32-bit field holding the sentinel
    pub fn zip64_extra(&self) -> Option<Zip64ExtendedInfo> {
        Zip64ExtendedInfo::from_header(self)
    }

    /// 64-bit local header offset, consulting the zip64 extra field if needed
    pub fn resolved_local_header_offset(&self) -> Option<u64> {
        if self.local_header_offset == ZIP64_SENTINEL {
            self.zip64_extra()?.local_header_offset
        } else {
            Some(u64::from(self.local_header_offset))
        }
    }

    /// 64-bit compressed size, consulting the zip64 extra field if needed
    pub fn resolved_compressed_size(&self) -> Option<u64> {
        if self.compressed_size == ZIP64_SENTINEL {
            self.zip64_extra()?.compressed_size
        } else {
            Some(u64::from(self.compressed_size))
        }
    }

    /// 64-bit uncompressed size, consulting the zip64 extra field if needed
    pub fn resolved_uncompressed_size(&self) -> Option<u64> {
        if self.uncompressed_size == ZIP64_SENTINEL {
            self.zip64_extra()?.uncompressed_size
        } else {
            Some(u64::from(self.uncompressed_size))
        }
    }
}

/// Local file header
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = 0x0403_4b50_u32)]
pub struct LocalFileHeader {
    /// Version needed to extract
    pub version_needed: u16,
    /// General purpose flags
    pub flags: u16,
    /// Compression method
    pub compression_method: u16,
    /// DOS modification time
    pub mod_time: u16,
    /// DOS modification date
    pub mod_date: u16,
    /// CRC-32 of the uncompressed data
    pub crc32: u32,
    /// Compressed size
    pub compressed_size: u32,
    /// Uncompressed size
    pub uncompressed_size: u32,
    /// Length of the entry name
    pub name_length: u16,
    /// Length of the extra field
    pub extra_length: u16,
    /// Entry name bytes
    #[br(count = usize::from(name_length))]
    pub name: Vec<u8>,
    /// Extra field bytes
    #[br(count = usize::from(extra_length))]
    pub extra: Vec<u8>,
}

impl LocalFileHeader {
    /// Name and extra field lengths from the fixed part of an encoded header
    pub fn variable_lengths(bytes: &[u8]) -> Option<(usize, usize)> {
        let name = bytes.get(26..28)?;
        let extra = bytes.get(28..30)?;
        Some((
            usize::from(u16::from_le_bytes([name[0], name[1]])),
            usize::from(u16::from_le_bytes([extra[0], extra[1]])),
        ))
    }

    /// Offset of the entry data relative to the start of the header
    pub fn data_offset(&self) -> usize {
        LOCAL_FILE_HEADER_SIZE + self.name.len() + self.extra.len()
    }
}

/// Decoded zip64 extended information extra field
///
/// Only the fields whose 32-bit (or 16-bit disk) counterpart holds the
/// sentinel are present, in the fixed order uncompressed size, compressed
/// size, local header offset, disk start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64ExtendedInfo {
    /// Uncompressed size
    pub uncompressed_size: Option<u64>,
    /// Compressed size
    pub compressed_size: Option<u64>,
    /// Local header offset
    pub local_header_offset: Option<u64>,
    /// Disk start number
    pub disk_start: Option<u32>,
}

impl Zip64ExtendedInfo {
    /// Parse the zip64 block of a central directory header's extra field
    ///
    /// Returns `None` when the block is absent or shorter than the sentinel
    /// fields require.
    pub fn from_header(header: &CentralDirectoryHeader) -> Option<Self> {
        let mut fields = find_extra_block(&header.extra, ZIP64_EXTRA_TAG)?;
        let mut info = Self::default();
        if header.uncompressed_size == ZIP64_SENTINEL {
            info.uncompressed_size = Some(take_u64(&mut fields)?);
        }
        if header.compressed_size == ZIP64_SENTINEL {
            info.compressed_size = Some(take_u64(&mut fields)?);
        }
        if header.local_header_offset == ZIP64_SENTINEL {
            info.local_header_offset = Some(take_u64(&mut fields)?);
        }
        if header.disk_start == ZIP64_SENTINEL_16 {
            info.disk_start = Some(take_u32(&mut fields)?);
        }
        Some(info)
    }

    /// Encode as a complete extra field block (tag, size, present fields)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(28);
        for value in [
            self.uncompressed_size,
            self.compressed_size,
            self.local_header_offset,
        ]
        .into_iter()
        .flatten()
        {
            body.extend_from_slice(&value.to_le_bytes());
        }
        if let Some(disk) = self.disk_start {
            body.extend_from_slice(&disk.to_le_bytes());
        }

        let mut block = Vec::with_capacity(4 + body.len());
        block.extend_from_slice(&ZIP64_EXTRA_TAG.to_le_bytes());
        block.extend_from_slice(&(body.len() as u16).to_le_bytes());
        block.extend_from_slice(&body);
        block
    }
}

fn find_extra_block(extra: &[u8], tag: u16) -> Option<&[u8]> {
    let mut rest = extra;
    while rest.len() >= 4 {
        let id = u16::from_le_bytes([rest[0], rest[1]]);
        let size = usize::from(u16::from_le_bytes([rest[2], rest[3]]));
        let body = rest.get(4..4 + size)?;
        if id == tag {
            return Some(body);
        }
        rest = &rest[4 + size..];
    }
    None
}

fn take_u64(fields: &mut &[u8]) -> Option<u64> {
    let current: &[u8] = *fields;
    let (head, tail) = current.split_first_chunk::<8>()?;
    *fields = tail;
    Some(u64::from_le_bytes(*head))
}

fn take_u32(fields: &mut &[u8]) -> Option<u32> {
    let current: &[u8] = *fields;
    let (head, tail) = current.split_first_chunk::<4>()?;
    *fields = tail;
    Some(u32::from_le_bytes(*head))
}

/// Decode a record from the start of `bytes`
pub(crate) fn decode<T>(bytes: &[u8]) -> BinResult<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    T::read_options(&mut Cursor::new(bytes), Endian::Little, ())
}

/// Encode a record into a fresh buffer
pub(crate) fn encode<T>(value: &T) -> BinResult<Vec<u8>>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(Vec::new());
    value.write_options(&mut cursor, Endian::Little, ())?;
    Ok(cursor.into_inner())
}

/// Read exactly `len` bytes at an absolute offset
pub(crate) fn read_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    len: usize,
) -> std::io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Position of the last occurrence of a little-endian signature
pub(crate) fn rfind_signature(bytes: &[u8], signature: u32) -> Option<usize> {
    let needle = signature.to_le_bytes();
    bytes.windows(4).rposition(|window| window == needle)
}

/// Position of the end of central directory record within a trailing window
///
/// Scans backward. A candidate whose comment length reaches exactly the end
/// of the window wins; otherwise the last candidate with a complete fixed
/// part is returned.
pub(crate) fn find_end_of_central_directory(window: &[u8]) -> Option<usize> {
    let needle = END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes();
    let last_start = window.len().checked_sub(END_OF_CENTRAL_DIRECTORY_SIZE)?;
    let mut fallback = None;

    for position in (0..=last_start).rev() {
        if window[position..position + 4] != needle {
            continue;
        }
        let comment_length = usize::from(u16::from_le_bytes([
            window[position + 20],
            window[position + 21],
        ]));
        if position + END_OF_CENTRAL_DIRECTORY_SIZE + comment_length == window.len() {
            return Some(position);
        }
        fallback.get_or_insert(position);
    }
    fallback
}
