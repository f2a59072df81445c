//! Index building from directory listings and streamed reports
//!
//! Both ingestion modes feed the same [`IndexBuilder`]. Nothing is written
//! until the full record set is known and sorted, so a failed or abandoned
//! build never leaves a partial index behind.

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::reader::SortedIndex;
use super::record::IndexRecord;
use super::report::ReportEntries;

/// Progress is logged every this many ingested entries
const PROGRESS_INTERVAL: usize = 1_000_000;

/// One entry of an enumerated archive directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Entry path as stored in the archive
    pub path: String,
    /// Offset of the entry's local header
    pub offset: u64,
    /// Whether the entry is a directory marker
    pub is_directory: bool,
}

impl DirectoryEntry {
    /// Create a file entry
    pub fn file(path: impl Into<String>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            is_directory: false,
        }
    }

    /// Create a directory entry
    pub fn directory(path: impl Into<String>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            is_directory: true,
        }
    }
}

/// Counters describing a finished build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Entries offered to the builder
    pub entries_seen: usize,
    /// Records in the produced index
    pub records: usize,
    /// Directory entries left out
    pub directories_skipped: usize,
    /// Embedded index entries left out
    pub reserved_skipped: usize,
    /// Adjacent records sharing a key after sorting
    pub duplicate_keys: usize,
    /// Report entries dropped by the line scanner
    pub report_entries_skipped: usize,
}

/// Collects records and produces a sorted index
#[derive(Debug)]
pub struct IndexBuilder<'a> {
    config: &'a IndexConfig,
    records: Vec<IndexRecord>,
    found_root: bool,
    summary: BuildSummary,
}

impl<'a> IndexBuilder<'a> {
    /// Create an empty builder
    pub fn new(config: &'a IndexConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            found_root: false,
            summary: BuildSummary::default(),
        }
    }

    /// Offer one archive entry, returning whether a record was added
    pub fn add_entry(&mut self, path: &str, offset: u64, is_directory: bool) -> bool {
        self.summary.entries_seen += 1;

        if is_directory {
            self.summary.directories_skipped += 1;
            return false;
        }
        if self.config.is_reserved(path) {
            self.summary.reserved_skipped += 1;
            return false;
        }
        if path == self.config.root_entry {
            self.found_root = true;
        }

        self.records.push(IndexRecord::for_path(path, offset));
        if self.records.len() % PROGRESS_INTERVAL == 0 {
            info!("Entries in table: {}", self.records.len());
        }
        true
    }

    /// Ingest an enumerated directory listing
    pub fn extend_from_listing<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = DirectoryEntry>,
    {
        for entry in entries {
            self.add_entry(&entry.path, entry.offset, entry.is_directory);
        }
    }

    /// Ingest a streamed textual report
    ///
    /// Fails with [`IndexError::IngestionParseDrift`] as soon as more entries
    /// are skipped than the configured limit allows.
    pub fn extend_from_report<R: BufRead>(&mut self, reader: R) -> IndexResult<()> {
        let mut entries = ReportEntries::new(reader);
        while let Some(entry) = entries.next() {
            let entry = entry?;
            let is_directory = entry.path.ends_with('/');
            self.add_entry(&entry.path, entry.offset, is_directory);
            self.check_drift(entries.skipped())?;
        }
        self.check_drift(entries.skipped())?;
        self.summary.report_entries_skipped += entries.skipped();
        debug!(
            "Scanned {} report lines, skipped {} entries",
            entries.lines_read(),
            entries.skipped()
        );
        Ok(())
    }

    fn check_drift(&self, skipped: usize) -> IndexResult<()> {
        match self.config.max_report_drift {
            Some(limit) if skipped > limit => {
                Err(IndexError::IngestionParseDrift { skipped, limit })
            }
            _ => Ok(()),
        }
    }

    /// Whether the tileset root entry has been seen
    pub fn has_root(&self) -> bool {
        self.found_root
    }

    /// Number of records collected so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records have been collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sort the collected records into an index
    pub fn finish(mut self) -> IndexResult<(SortedIndex, BuildSummary)> {
        if !self.found_root {
            return Err(IndexError::MissingRootEntry(self.config.root_entry.clone()));
        }

        let started = Instant::now();
        self.records.sort_unstable();
        info!(
            "Sorted {} index records in {:?}",
            self.records.len(),
            started.elapsed()
        );

        let duplicates = self
            .records
            .windows(2)
            .filter(|pair| pair[0].key == pair[1].key)
            .count();
        if duplicates > 0 {
            warn!("{duplicates} key collisions in index; run validation for details");
        }

        self.summary.records = self.records.len();
        self.summary.duplicate_keys = duplicates;
        Ok((SortedIndex::from_records(self.records), self.summary))
    }

    /// Sort the collected records and write the index blob to `destination`
    pub fn write_to<P: AsRef<Path>>(
        self,
        destination: P,
    ) -> IndexResult<(SortedIndex, BuildSummary)> {
        let overwrite = self.config.overwrite;
        let (index, summary) = self.finish()?;
        write_index_file(destination, &index, overwrite)?;
        Ok((index, summary))
    }
}

/// Build an index from an enumerated directory listing and write it
pub fn build_from_listing<I, P>(
    entries: I,
    destination: P,
    config: &IndexConfig,
) -> IndexResult<BuildSummary>
where
    I: IntoIterator<Item = DirectoryEntry>,
    P: AsRef<Path>,
{
    ensure_writable(destination.as_ref(), config.overwrite)?;

    let started = Instant::now();
    let mut builder = IndexBuilder::new(config);
    builder.extend_from_listing(entries);
    info!(
        "Read {} archive entries in {:?}",
        builder.summary.entries_seen,
        started.elapsed()
    );

    let (_, summary) = builder.write_to(destination)?;
    info!(
        "Archive contained {} entries - wrote {} index entries",
        summary.entries_seen, summary.records
    );
    Ok(summary)
}

/// Build an index from a streamed textual report and write it
pub fn build_from_report<R, P>(
    reader: R,
    destination: P,
    config: &IndexConfig,
) -> IndexResult<BuildSummary>
where
    R: BufRead,
    P: AsRef<Path>,
{
    ensure_writable(destination.as_ref(), config.overwrite)?;

    let started = Instant::now();
    let mut builder = IndexBuilder::new(config);
    builder.extend_from_report(reader)?;
    info!(
        "Read {} report entries in {:?}",
        builder.summary.entries_seen,
        started.elapsed()
    );

    let (_, summary) = builder.write_to(destination)?;
    info!("Wrote {} index entries", summary.records);
    Ok(summary)
}

/// Refuse to proceed when `path` exists and overwriting is off
///
/// The check is not atomic with the later write; concurrent writers to the
/// same path are not detected.
pub fn ensure_writable(path: &Path, overwrite: bool) -> IndexResult<()> {
    if !overwrite && path.exists() {
        return Err(IndexError::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

/// Write a serialized index to `path`
///
/// Bytes go to a sibling temporary file that is renamed into place, so a
/// failed write leaves no partial index at `path`.
pub fn write_index_file<P: AsRef<Path>>(
    path: P,
    index: &SortedIndex,
    overwrite: bool,
) -> IndexResult<()> {
    write_blob(path.as_ref(), &index.to_bytes()?, overwrite)
}

/// Write raw bytes to `path` with the same overwrite and atomicity rules
pub fn write_blob(path: &Path, bytes: &[u8], overwrite: bool) -> IndexResult<()> {
    ensure_writable(path, overwrite)?;

    let started = Instant::now();
    let partial = partial_path(path);
    let result = File::create(&partial).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&partial, path) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }

    info!(
        "Wrote {} bytes to {} in {:?}",
        bytes.len(),
        path.display(),
        started.elapsed()
    );
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn listing(paths: &[&str]) -> Vec<DirectoryEntry> {
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| DirectoryEntry::file(*p, i as u64 * 1000))
            .collect()
    }

    #[test]
    fn test_build_requires_root_entry() {
        let config = IndexConfig::default();
        let mut builder = IndexBuilder::new(&config);
        builder.extend_from_listing(listing(&["a", "b", "c/d", "e"]));
        assert!(matches!(
            builder.finish(),
            Err(IndexError::MissingRootEntry(name)) if name == "tileset.json"
        ));
    }

    #[test]
    fn test_root_must_be_top_level() {
        let config = IndexConfig::default();
        let mut builder = IndexBuilder::new(&config);
        builder.extend_from_listing(listing(&["sub/tileset.json", "a"]));
        assert!(!builder.has_root());
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_build_sorts_strictly_ascending() {
        let config = IndexConfig::default();
        let mut builder = IndexBuilder::new(&config);
        let paths: Vec<String> = (0..5000).map(|i| format!("tiles/{i}.b3dm")).collect();
        for (i, path) in paths.iter().enumerate() {
            builder.add_entry(path, i as u64, false);
        }
        builder.add_entry("tileset.json", 99_999, false);

        let (index, summary) = builder.finish().expect("build");
        assert_eq!(summary.records, 5001);
        assert_eq!(summary.duplicate_keys, 0);
        for pair in index.records().windows(2) {
            assert!(pair[0].key < pair[1].key);
        }
    }

    #[test]
    fn test_build_skips_directories_and_reserved_entries() {
        let config = IndexConfig::default();
        let mut builder = IndexBuilder::new(&config);
        builder.extend_from_listing(vec![
            DirectoryEntry::file("tileset.json", 0),
            DirectoryEntry::directory("tiles/", 100),
            DirectoryEntry::file("tiles/0.b3dm", 200),
            DirectoryEntry::file("@3dtilesIndex1@", 300),
            DirectoryEntry::file("@specialIndexFileHASH128@", 400),
        ]);
        let (index, summary) = builder.finish().expect("build");

        assert_eq!(index.len(), 2);
        assert_eq!(summary.entries_seen, 5);
        assert_eq!(summary.directories_skipped, 1);
        assert_eq!(summary.reserved_skipped, 2);
        assert!(index.lookup("@3dtilesIndex1@").is_none());
    }

    #[test]
    fn test_duplicate_paths_are_kept_and_counted() {
        let config = IndexConfig::default();
        let mut builder = IndexBuilder::new(&config);
        builder.extend_from_listing(vec![
            DirectoryEntry::file("tileset.json", 0),
            DirectoryEntry::file("dup.b3dm", 10),
            DirectoryEntry::file("dup.b3dm", 20),
        ]);
        let (index, summary) = builder.finish().expect("build");
        assert_eq!(index.len(), 3);
        assert_eq!(summary.duplicate_keys, 1);
    }

    #[test]
    fn test_build_from_listing_writes_blob() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("index.bin");
        let config = IndexConfig::default();

        let summary = build_from_listing(
            listing(&["a", "b", "tileset.json", "c/d", "e"]),
            &output,
            &config,
        )
        .expect("build");
        assert_eq!(summary.records, 5);

        let bytes = fs::read(&output).expect("read");
        assert_eq!(bytes.len(), 5 * 24);
        let index = SortedIndex::from_bytes(&bytes).expect("decode");
        assert_eq!(index.lookup("c/d").map(|r| r.offset), Some(3000));
        assert!(index.lookup("missing").is_none());
        assert!(!dir.path().join("index.bin.partial").exists());
    }

    #[test]
    fn test_missing_root_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("index.bin");
        let result = build_from_listing(listing(&["a", "b"]), &output, &IndexConfig::default());
        assert!(matches!(result, Err(IndexError::MissingRootEntry(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_existing_output_requires_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("index.bin");
        fs::write(&output, b"keep me").expect("write");

        let config = IndexConfig::default();
        let result = build_from_listing(listing(&["tileset.json"]), &output, &config);
        assert!(matches!(result, Err(IndexError::OutputExists(_))));
        assert_eq!(fs::read(&output).expect("read"), b"keep me");

        let config = IndexConfig::default().with_overwrite(true);
        build_from_listing(listing(&["tileset.json"]), &output, &config).expect("overwrite");
        assert_eq!(fs::read(&output).expect("read").len(), 24);
    }

    #[test]
    fn test_build_from_report() {
        let report = "\
Central directory entry #1:
---------------------------

  tileset.json

  offset of local header from start of archive:   0
Central directory entry #2:
---------------------------

  tiles/

  offset of local header from start of archive:   60
Central directory entry #3:
---------------------------

  tiles/0.b3dm

  offset of local header from start of archive:   100
";
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("large.idx");
        let summary =
            build_from_report(Cursor::new(report), &output, &IndexConfig::default()).expect("build");

        assert_eq!(summary.records, 2);
        assert_eq!(summary.directories_skipped, 1);
        let index = SortedIndex::open(&output).expect("open");
        assert_eq!(index.lookup("tiles/0.b3dm").map(|r| r.offset), Some(100));
    }

    #[test]
    fn test_report_drift_limit() {
        let report = "\
Central directory entry #1:

  tileset.json
Central directory entry #2:

  a.b3dm
  offset of local header from start of archive:   7
";
        let config = IndexConfig::default().with_max_report_drift(Some(0));
        let mut builder = IndexBuilder::new(&config);
        let result = builder.extend_from_report(Cursor::new(report));
        assert!(matches!(
            result,
            Err(IndexError::IngestionParseDrift { skipped: 1, limit: 0 })
        ));

        // Unlimited drift skips the damaged entry, which here is the root
        let config = IndexConfig::default();
        let mut builder = IndexBuilder::new(&config);
        builder.extend_from_report(Cursor::new(report)).expect("ingest");
        assert_eq!(builder.len(), 1);
        assert!(matches!(builder.finish(), Err(IndexError::MissingRootEntry(_))));
    }
}
