//! `validate-index`

use crate::CommandContext;
use crate::output::emit;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tilearc_index::index::{ValidationReport, validate};
use tilearc_index::{CollisionPolicy, SortedIndex};

#[derive(Serialize)]
struct ValidateOutput<'a> {
    index: &'a Path,
    valid: bool,
    #[serde(flatten)]
    report: ValidationReport,
}

/// Validate an index; returns whether it is valid under `policy`
pub fn handle(index: &Path, policy: CollisionPolicy, ctx: &CommandContext) -> Result<bool> {
    let loaded = SortedIndex::load(index, &ctx.config)
        .with_context(|| format!("Failed to read index from {}", index.display()))?;

    let report = validate(loaded.records(), policy);
    let valid = report.is_valid();
    let result = ValidateOutput {
        index,
        valid,
        report,
    };
    emit(ctx.format, &result, |r| {
        format!(
            "{} is {} ({} records, {} order violations, {} collisions)",
            r.index.display(),
            if r.valid { "valid" } else { "invalid" },
            r.report.record_count,
            r.report.order_violations.len(),
            r.report.collisions.len()
        )
    })?;
    Ok(valid)
}
