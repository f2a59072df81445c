//! tilearc command-line library
//!
//! Argument types and command handlers behind the `tilearc` binary.

pub mod commands;
pub mod output;

use clap::{Args, Subcommand};
use std::path::PathBuf;
use tilearc_index::{CollisionPolicy, IndexConfig};

pub use crate::commands::run;

/// Index commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an index from an archive's central directory
    GenerateIndex {
        /// Tile archive to index
        archive: PathBuf,

        /// Where to write the index blob
        output: PathBuf,
    },

    /// Build an index from a verbose listing report (`zipinfo -v` output)
    GenerateLargeIndex {
        /// Report file, or `-` for standard input
        report: PathBuf,

        /// Where to write the index blob
        output: PathBuf,
    },

    /// Extract the embedded index from an archive
    ExtractIndex {
        /// Tile archive holding an embedded index
        archive: PathBuf,

        /// Where to write the index blob; omit to only summarize it
        output: Option<PathBuf>,
    },

    /// Look up the local header offset of an entry path
    SearchIndex {
        /// Index blob or tile archive
        index: PathBuf,

        /// Entry path inside the archive
        path: String,
    },

    /// Print index records in a position range
    ListIndex {
        /// Index blob or tile archive
        index: PathBuf,

        /// Start position and optional end position (exclusive)
        #[arg(short, long, num_args = 1..=2, default_values_t = [0, 10])]
        range: Vec<usize>,
    },

    /// Check record order and report key collisions
    ValidateIndex {
        /// Index blob or tile archive
        index: PathBuf,

        /// How collisions affect the result
        #[arg(long, value_enum, env = "TILEARC_COLLISIONS", default_value = "invalidate")]
        collisions: CollisionMode,
    },

    /// Re-offset a prior index against a re-packed archive
    RepairIndex {
        /// Re-packed tile archive
        archive: PathBuf,

        /// Index built for the archive before re-packing
        prior: PathBuf,

        /// Where to write the repaired index blob
        output: PathBuf,
    },
}

/// Collision handling selectable on the command line
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionMode {
    /// Any collision makes the index invalid
    Invalidate,
    /// Collisions are reported but do not affect validity
    Advisory,
}

impl From<CollisionMode> for CollisionPolicy {
    fn from(mode: CollisionMode) -> Self {
        match mode {
            CollisionMode::Invalidate => Self::Invalidate,
            CollisionMode::Advisory => Self::Advisory,
        }
    }
}

/// Output format options for the CLI
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON output
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

/// Options mapped onto [`IndexConfig`]
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Overwrite existing output files
    #[arg(short, long, global = true, env = "TILEARC_FORCE")]
    pub force: bool,

    /// Root entry every archive must contain
    #[arg(long, global = true, env = "TILEARC_ROOT_ENTRY")]
    pub root_entry: Option<String>,

    /// Name of the embedded index entry
    #[arg(long, global = true, env = "TILEARC_RESERVED_ENTRY")]
    pub reserved_entry: Option<String>,

    /// Initial trailing window for reading the archive trailer (bytes)
    #[arg(long, global = true, env = "TILEARC_TRAILER_WINDOW")]
    pub trailer_window: Option<usize>,

    /// Extra bytes read past a local header for its extra field
    #[arg(long, global = true, env = "TILEARC_LOCAL_HEADER_SLACK")]
    pub local_header_slack: Option<usize>,

    /// Abort report ingestion after this many skipped entries
    #[arg(long, global = true, env = "TILEARC_MAX_REPORT_DRIFT")]
    pub max_report_drift: Option<usize>,
}

impl ConfigArgs {
    /// Build the index configuration these options describe
    pub fn to_config(&self) -> IndexConfig {
        let mut config = IndexConfig::new()
            .with_overwrite(self.force)
            .with_max_report_drift(self.max_report_drift);
        if let Some(name) = &self.root_entry {
            config = config.with_root_entry(name.clone());
        }
        if let Some(name) = &self.reserved_entry {
            config = config.with_reserved_entry(name.clone());
        }
        if let Some(size) = self.trailer_window {
            config = config.with_trailer_window(size);
        }
        if let Some(slack) = self.local_header_slack {
            config = config.with_local_header_slack(slack);
        }
        config
    }
}

/// Context for command execution
#[derive(Clone, Debug)]
pub struct CommandContext {
    /// Output format
    pub format: OutputFormat,
    /// Index configuration
    pub config: IndexConfig,
}
