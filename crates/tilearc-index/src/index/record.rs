//! Fixed 24-byte index records and the headerless blob codec
//!
//! ```text
//! [0, 16)  path key (raw MD5 bytes)
//! [16, 24) local header offset (u64, little-endian)
//! ```
//!
//! A serialized index is nothing but records back to back. Its length is the
//! only self-description, so any length that is not a multiple of
//! [`RECORD_SIZE`] is rejected.

use crate::error::{IndexError, IndexResult};
use crate::key::PathKey;
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use serde::{Deserialize, Serialize};

use super::RECORD_SIZE;

/// One index record: a path key and the offset of its local file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BinRead, BinWrite, Serialize, Deserialize)]
#[brw(little)]
pub struct IndexRecord {
    /// Key derived from the entry path
    pub key: PathKey,
    /// Byte offset of the entry's local header within the archive
    pub offset: u64,
}

impl IndexRecord {
    /// Create a record from a key and offset
    pub const fn new(key: PathKey, offset: u64) -> Self {
        Self { key, offset }
    }

    /// Create a record for an entry path
    pub fn for_path(path: &str, offset: u64) -> Self {
        Self::new(PathKey::from_path(path), offset)
    }

    /// Serialize to the fixed 24-byte layout
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[..16].copy_from_slice(self.key.as_bytes());
        bytes[16..].copy_from_slice(&self.offset.to_le_bytes());
        bytes
    }
}

impl PartialOrd for IndexRecord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexRecord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.offset.cmp(&other.offset))
    }
}

/// Encode records back to back in the order given
pub fn encode_records(records: &[IndexRecord]) -> IndexResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(records.len() * RECORD_SIZE));
    for record in records {
        record.write(&mut cursor)?;
    }
    Ok(cursor.into_inner())
}

/// Decode a headerless index blob
pub fn decode_records(data: &[u8]) -> IndexResult<Vec<IndexRecord>> {
    if data.len() % RECORD_SIZE != 0 {
        return Err(IndexError::MalformedIndexLength {
            length: data.len(),
            record_size: RECORD_SIZE,
        });
    }

    let count = data.len() / RECORD_SIZE;
    let mut cursor = Cursor::new(data);
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(IndexRecord::read(&mut cursor)?);
    }
    Ok(records)
}
