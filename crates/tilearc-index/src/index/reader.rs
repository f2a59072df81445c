//! Sorted index reader and path lookup

use crate::archive::{ArchiveBootstrap, LOCAL_FILE_HEADER_SIGNATURE};
use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::key::PathKey;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::record::{IndexRecord, decode_records, encode_records};

/// Byte-offset-by-path lookup consumed by tile readers
pub trait OffsetLookup {
    /// Offset of the local header for `path`, if the path is indexed
    fn offset_of(&self, path: &str) -> Option<u64>;
}

/// Decoded index, ordered by [`PathKey`]
///
/// The reader trusts the order it is given; use
/// [`validate`](crate::index::validate) to check an index from an untrusted
/// source before relying on lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedIndex {
    records: Vec<IndexRecord>,
}

impl SortedIndex {
    /// Wrap records that are already sorted by key
    pub fn from_records(records: Vec<IndexRecord>) -> Self {
        Self { records }
    }

    /// Decode a serialized index blob
    pub fn from_bytes(data: &[u8]) -> IndexResult<Self> {
        Ok(Self::from_records(decode_records(data)?))
    }

    /// Read a raw index blob from disk
    pub fn open<P: AsRef<Path>>(path: P) -> IndexResult<Self> {
        let data = std::fs::read(path.as_ref())?;
        let index = Self::from_bytes(&data)?;
        debug!(
            "Read index {} with {} records",
            path.as_ref().display(),
            index.len()
        );
        Ok(index)
    }

    /// Load an index from a raw blob or from the embedded entry of an archive
    ///
    /// Archives are recognized by the local file header signature at byte 0.
    /// A blob whose first key happens to start with that signature has no
    /// central directory, so it is read as a blob after extraction fails.
    pub fn load<P: AsRef<Path>>(path: P, config: &IndexConfig) -> IndexResult<Self> {
        let path = path.as_ref();
        if !is_archive(path)? {
            return Self::open(path);
        }

        info!("Extracting embedded index from {}", path.display());
        let file = File::open(path)?;
        match ArchiveBootstrap::new(config).extract(file) {
            Ok(embedded) => Self::from_bytes(&embedded.into_blob()?),
            Err(archive_error @ IndexError::CorruptCentralDirectory { .. }) => {
                debug!("{archive_error}; reading {} as an index blob", path.display());
                Self::open(path).map_err(|_| archive_error)
            }
            Err(e) => Err(e),
        }
    }

    /// Serialize back to the headerless blob layout
    pub fn to_bytes(&self) -> IndexResult<Vec<u8>> {
        encode_records(&self.records)
    }

    /// Binary search for an exact key, returning its position
    pub fn find(&self, key: &PathKey) -> Option<usize> {
        self.records.binary_search_by(|r| r.key.cmp(key)).ok()
    }

    /// Find the record for an entry path
    pub fn lookup(&self, path: &str) -> Option<&IndexRecord> {
        self.find(&PathKey::from_path(path))
            .map(|position| &self.records[position])
    }

    /// Records between positions `start` (inclusive) and `end` (exclusive)
    ///
    /// `end` is clamped to the record count; a `start` at or past the clamped
    /// end yields an empty slice.
    pub fn list(&self, start: usize, end: usize) -> IndexResult<&[IndexRecord]> {
        if start > end {
            return Err(IndexError::InvalidRange { start, end });
        }
        let end = end.min(self.records.len());
        let start = start.min(end);
        Ok(&self.records[start..end])
    }

    /// Record at a position
    pub fn get(&self, position: usize) -> Option<&IndexRecord> {
        self.records.get(position)
    }

    /// All records in order
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// Consume into the underlying records
    pub fn into_records(self) -> Vec<IndexRecord> {
        self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the index has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl OffsetLookup for SortedIndex {
    fn offset_of(&self, path: &str) -> Option<u64> {
        self.lookup(path).map(|record| record.offset)
    }
}

fn is_archive(path: &Path) -> IndexResult<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(u32::from_le_bytes(magic) == LOCAL_FILE_HEADER_SIGNATURE),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn sorted_index(paths: &[&str]) -> SortedIndex {
        let mut records: Vec<IndexRecord> = paths
            .iter()
            .enumerate()
            .map(|(i, p)| IndexRecord::for_path(p, i as u64 * 100))
            .collect();
        records.sort();
        SortedIndex::from_records(records)
    }

    #[test]
    fn test_lookup_present_and_missing() {
        let index = sorted_index(&["a", "b", "tileset.json", "c/d", "e"]);
        assert_eq!(index.offset_of("c/d"), Some(300));
        assert_eq!(index.offset_of("tileset.json"), Some(200));
        assert_eq!(index.offset_of("missing"), None);
    }

    #[test]
    fn test_find_on_empty_index() {
        let index = SortedIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.find(&PathKey::from_path("a")), None);
    }

    #[test]
    fn test_list_clamps_end() {
        let index = sorted_index(&["a", "b", "c"]);
        assert_eq!(index.list(0, 10).expect("list").len(), 3);
        assert_eq!(index.list(1, 2).expect("list").len(), 1);
        assert!(index.list(5, 10).expect("list").is_empty());
        assert!(matches!(
            index.list(2, 1),
            Err(IndexError::InvalidRange { start: 2, end: 1 })
        ));
    }

    #[test]
    fn test_bytes_round_trip() {
        let index = sorted_index(&["x", "y/z"]);
        let bytes = index.to_bytes().expect("encode");
        assert_eq!(SortedIndex::from_bytes(&bytes).expect("decode"), index);
    }

    #[test]
    fn test_load_raw_blob_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.bin");
        let index = sorted_index(&["a", "tileset.json"]);
        std::fs::write(&path, index.to_bytes().expect("encode")).expect("write");

        let loaded = SortedIndex::load(&path, &IndexConfig::default()).expect("load");
        assert_eq!(loaded, index);
    }

    #[test]
    fn test_load_blob_starting_with_archive_signature() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.bin");
        let mut first = [0u8; 16];
        first[..4].copy_from_slice(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes());
        let index = SortedIndex::from_records(vec![
            IndexRecord::new(PathKey::from_bytes(first), 10),
            IndexRecord::new(PathKey::from_bytes([0xff; 16]), 20),
        ]);
        std::fs::write(&path, index.to_bytes().expect("encode")).expect("write");

        let loaded = SortedIndex::load(&path, &IndexConfig::default()).expect("load");
        assert_eq!(loaded, index);
    }

    #[test]
    fn test_load_unreadable_archive_keeps_archive_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.3tz");
        let mut bytes = LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 41]);
        std::fs::write(&path, bytes).expect("write");

        assert!(matches!(
            SortedIndex::load(&path, &IndexConfig::default()),
            Err(IndexError::CorruptCentralDirectory { .. })
        ));
    }

    proptest! {
        #[test]
        fn find_locates_every_inserted_key(
            keys in prop::collection::btree_set(prop::array::uniform16(any::<u8>()), 1..300),
            absent in prop::array::uniform16(any::<u8>()),
        ) {
            let mut records: Vec<IndexRecord> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| IndexRecord::new(PathKey::from_bytes(*k), i as u64))
                .collect();
            records.sort();
            let index = SortedIndex::from_records(records.clone());

            for (position, record) in records.iter().enumerate() {
                prop_assert_eq!(index.find(&record.key), Some(position));
            }

            let inserted: BTreeSet<[u8; 16]> = keys;
            if !inserted.contains(&absent) {
                prop_assert_eq!(index.find(&PathKey::from_bytes(absent)), None);
            }
        }
    }
}
