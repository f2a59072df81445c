//! `search-index`

use crate::CommandContext;
use crate::output::emit;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tilearc_index::key::normalize_path;
use tilearc_index::{PathKey, SortedIndex};
use tracing::info;

#[derive(Serialize)]
struct SearchOutput {
    path: String,
    key: String,
    position: Option<usize>,
    offset: Option<u64>,
}

/// Look up one entry path; returns whether it was found
pub fn handle(index: &Path, path: &str, ctx: &CommandContext) -> Result<bool> {
    let started = Instant::now();
    let loaded = SortedIndex::load(index, &ctx.config)
        .with_context(|| format!("Failed to read index from {}", index.display()))?;
    info!(
        "Zip index contains {} entries (read in {:?})",
        loaded.len(),
        started.elapsed()
    );

    let path = normalize_path(path);
    let key = PathKey::from_path(&path);
    info!("Searching index for {path} ({key})");

    let position = loaded.find(&key);
    let result = SearchOutput {
        offset: position.and_then(|p| loaded.get(p)).map(|r| r.offset),
        key: key.to_hex(),
        path,
        position,
    };
    emit(ctx.format, &result, |r| match (r.position, r.offset) {
        (Some(position), Some(offset)) => {
            format!("Matched index: {position} - offset: {offset}")
        }
        _ => format!("Couldn't find {} ({}) in {}", r.path, r.key, index.display()),
    })?;
    Ok(result.position.is_some())
}
