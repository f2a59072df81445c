//! `list-index`

use crate::CommandContext;
use crate::output::{ListedRecord, emit, format_record};
use anyhow::{Context, Result, bail};
use std::path::Path;
use tilearc_index::SortedIndex;

/// Print the records in `range`
///
/// A single value lists from that position to the end; a second value is an
/// exclusive end, clamped to the record count.
pub fn handle(index: &Path, range: &[usize], ctx: &CommandContext) -> Result<()> {
    let (start, end) = match *range {
        [start] => (start, usize::MAX),
        [start, end] => (start, end),
        _ => bail!("Invalid range, expected one or two positions"),
    };

    let loaded = SortedIndex::load(index, &ctx.config)
        .with_context(|| format!("Failed to read index from {}", index.display()))?;
    let records = loaded.list(start, end)?;

    let listed: Vec<ListedRecord> = records
        .iter()
        .enumerate()
        .map(|(i, record)| ListedRecord::new(start + i, record))
        .collect();
    emit(ctx.format, &listed, |rows| {
        rows.iter().map(format_record).collect::<Vec<_>>().join("\n")
    })
}
