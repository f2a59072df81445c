//! Command handlers
//!
//! Each handler returns whether the command succeeded in the sense the exit
//! status should report: a missing lookup key or an invalid index is not an
//! error, but still exits non-zero.

pub mod extract;
pub mod generate;
pub mod list;
pub mod repair;
pub mod search;
pub mod validate;

use crate::{CommandContext, Commands};
use anyhow::Result;

/// Run one command
pub fn run(command: Commands, ctx: &CommandContext) -> Result<bool> {
    match command {
        Commands::GenerateIndex { archive, output } => {
            generate::handle_listing(&archive, &output, ctx).map(|()| true)
        }
        Commands::GenerateLargeIndex { report, output } => {
            generate::handle_report(&report, &output, ctx).map(|()| true)
        }
        Commands::ExtractIndex { archive, output } => {
            extract::handle(&archive, output.as_deref(), ctx).map(|()| true)
        }
        Commands::SearchIndex { index, path } => search::handle(&index, &path, ctx),
        Commands::ListIndex { index, range } => list::handle(&index, &range, ctx).map(|()| true),
        Commands::ValidateIndex { index, collisions } => {
            validate::handle(&index, collisions.into(), ctx)
        }
        Commands::RepairIndex {
            archive,
            prior,
            output,
        } => repair::handle(&archive, &prior, &output, ctx).map(|()| true),
    }
}
