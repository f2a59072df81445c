//! `generate-index` and `generate-large-index`

use crate::CommandContext;
use crate::output::emit;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tilearc_index::archive::CentralDirectory;
use tilearc_index::index::{BuildSummary, build_from_listing, build_from_report};
use tracing::info;

#[derive(Serialize)]
struct GenerateOutput<'a> {
    output: &'a Path,
    #[serde(flatten)]
    summary: BuildSummary,
}

/// Index an archive through its central directory
pub fn handle_listing(archive: &Path, output: &Path, ctx: &CommandContext) -> Result<()> {
    let directory = CentralDirectory::open(archive)
        .with_context(|| format!("Failed to read central directory of {}", archive.display()))?;
    let summary = build_from_listing(directory.listing(), output, &ctx.config)
        .with_context(|| format!("Failed to build index for {}", archive.display()))?;

    emit(ctx.format, &GenerateOutput { output, summary }, |r| {
        format!(
            "Archive contained {} entries - wrote {} index entries to {}",
            r.summary.entries_seen,
            r.summary.records,
            r.output.display()
        )
    })
}

/// Index an archive from a streamed verbose listing
pub fn handle_report(report: &Path, output: &Path, ctx: &CommandContext) -> Result<()> {
    let reader: Box<dyn BufRead> = if report.as_os_str() == "-" {
        info!("Reading report from standard input");
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(report)
            .with_context(|| format!("Failed to open report {}", report.display()))?;
        Box::new(BufReader::new(file))
    };

    let summary = build_from_report(reader, output, &ctx.config)
        .with_context(|| format!("Failed to build index from {}", report.display()))?;

    emit(ctx.format, &GenerateOutput { output, summary }, |r| {
        let mut text = format!(
            "Wrote {} index entries to {}",
            r.summary.records,
            r.output.display()
        );
        if r.summary.report_entries_skipped > 0 {
            text.push_str(&format!(
                " ({} report entries skipped)",
                r.summary.report_entries_skipped
            ));
        }
        text
    })
}
