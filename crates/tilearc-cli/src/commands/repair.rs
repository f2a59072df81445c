//! `repair-index`

use crate::CommandContext;
use crate::output::emit;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tilearc_index::SortedIndex;
use tilearc_index::archive::CentralDirectory;
use tilearc_index::index::{RepairSummary, repair};

#[derive(Serialize)]
struct RepairOutput<'a> {
    output: &'a Path,
    #[serde(flatten)]
    summary: RepairSummary,
}

/// Re-offset `prior` against the current entries of `archive`
pub fn handle(archive: &Path, prior: &Path, output: &Path, ctx: &CommandContext) -> Result<()> {
    let prior_index = SortedIndex::load(prior, &ctx.config)
        .with_context(|| format!("Failed to read prior index from {}", prior.display()))?;
    let directory = CentralDirectory::open(archive)
        .with_context(|| format!("Failed to read central directory of {}", archive.display()))?;

    let summary = repair(&prior_index, directory.listing(), output, &ctx.config)
        .with_context(|| format!("Failed to repair index for {}", archive.display()))?;

    emit(ctx.format, &RepairOutput { output, summary }, |r| {
        format!(
            "Repaired {} records ({} moved, {} unindexed entries) into {}",
            r.summary.records,
            r.summary.moved,
            r.summary.unindexed,
            r.output.display()
        )
    })
}
