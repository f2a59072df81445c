//! Re-offsetting an index against a re-packed archive
//!
//! Re-packing keeps entry paths but moves local headers. Repair keeps the key
//! set of the prior index, looks each key up in a fresh directory listing, and
//! writes a new sorted index. The prior blob is only read.

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::key::PathKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::builder::{DirectoryEntry, ensure_writable, write_index_file};
use super::reader::SortedIndex;
use super::record::IndexRecord;

/// Counters describing a repair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairSummary {
    /// Records in the repaired index
    pub records: usize,
    /// Records whose offset changed
    pub moved: usize,
    /// Listing entries with no record in the prior index
    pub unindexed: usize,
    /// Prior keys not found in the listing
    pub missing: usize,
}

/// Re-associate the prior index's keys with offsets from a fresh listing
///
/// Fails with [`IndexError::RepairKeyMissing`] if any prior key has no entry
/// in the listing; nothing is produced in that case.
pub fn reoffset<I>(
    prior: &SortedIndex,
    listing: I,
    config: &IndexConfig,
) -> IndexResult<(SortedIndex, RepairSummary)>
where
    I: IntoIterator<Item = DirectoryEntry>,
{
    let mut current: HashMap<PathKey, u64> = HashMap::with_capacity(prior.len());
    let mut summary = RepairSummary::default();

    for entry in listing {
        if entry.is_directory || config.is_reserved(&entry.path) {
            continue;
        }
        let key = PathKey::from_path(&entry.path);
        if prior.find(&key).is_none() {
            summary.unindexed += 1;
            continue;
        }
        current.insert(key, entry.offset);
    }

    let mut records = Vec::with_capacity(prior.len());
    for record in prior.records() {
        match current.get(&record.key) {
            Some(&offset) => {
                if offset != record.offset {
                    summary.moved += 1;
                }
                records.push(IndexRecord::new(record.key, offset));
            }
            None => summary.missing += 1,
        }
    }

    if summary.missing > 0 {
        warn!(
            "{} of {} indexed entries are absent from the listing",
            summary.missing,
            prior.len()
        );
        return Err(IndexError::RepairKeyMissing {
            missing: summary.missing,
        });
    }
    if summary.unindexed > 0 {
        warn!(
            "{} archive entries are not in the prior index and stay unindexed",
            summary.unindexed
        );
    }

    records.sort_unstable();
    summary.records = records.len();
    Ok((SortedIndex::from_records(records), summary))
}

/// Repair `prior` against `listing` and write the result to `destination`
pub fn repair<I, P>(
    prior: &SortedIndex,
    listing: I,
    destination: P,
    config: &IndexConfig,
) -> IndexResult<RepairSummary>
where
    I: IntoIterator<Item = DirectoryEntry>,
    P: AsRef<Path>,
{
    let destination = destination.as_ref();
    ensure_writable(destination, config.overwrite)?;

    let (index, summary) = reoffset(prior, listing, config)?;
    write_index_file(destination, &index, config.overwrite)?;
    info!(
        "Repaired {} records ({} moved) into {}",
        summary.records,
        summary.moved,
        destination.display()
    );
    Ok(summary)
}
