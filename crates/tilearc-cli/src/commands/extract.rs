//! `extract-index`

use crate::CommandContext;
use crate::output::emit;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tilearc_index::archive::ArchiveBootstrap;
use tilearc_index::index::{RECORD_SIZE, write_blob};

#[derive(Serialize)]
struct ExtractOutput<'a> {
    entry: String,
    local_header_offset: u64,
    compression_method: u16,
    bytes: usize,
    records: usize,
    output: Option<&'a Path>,
}

/// Pull the embedded index out of an archive, optionally saving it
pub fn handle(archive: &Path, output: Option<&Path>, ctx: &CommandContext) -> Result<()> {
    let embedded = ArchiveBootstrap::new(&ctx.config)
        .open(archive)
        .with_context(|| format!("Failed to read embedded index from {}", archive.display()))?;
    let entry = embedded.name.clone();
    let local_header_offset = embedded.local_header_offset;
    let compression_method = embedded.compression_method;
    let blob = embedded.into_blob()?;

    if let Some(path) = output {
        write_blob(path, &blob, ctx.config.overwrite)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let result = ExtractOutput {
        entry,
        local_header_offset,
        compression_method,
        bytes: blob.len(),
        records: blob.len() / RECORD_SIZE,
        output,
    };
    emit(ctx.format, &result, |r| match r.output {
        Some(path) => format!(
            "Wrote embedded index '{}' ({} records, {} bytes) to {}",
            r.entry,
            r.records,
            r.bytes,
            path.display()
        ),
        None => format!(
            "Embedded index '{}' at offset {}: {} records, {} bytes",
            r.entry, r.local_header_offset, r.records, r.bytes
        ),
    })
}
