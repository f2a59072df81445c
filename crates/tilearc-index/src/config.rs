//! Configuration passed explicitly to every index operation

use crate::archive::constants::MAX_TRAILER_SIZE;
use serde::{Deserialize, Serialize};

/// Name of the tileset root entry every tile archive must contain
pub const DEFAULT_ROOT_ENTRY: &str = "tileset.json";

/// Name of the archive entry holding the embedded index
pub const DEFAULT_RESERVED_ENTRY: &str = "@3dtilesIndex1@";

/// Sentinel name used by older packaging tools for the embedded index
pub const LEGACY_RESERVED_ENTRY: &str = "@specialIndexFileHASH128@";

/// How key collisions affect overall index validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Any collision makes the index invalid
    #[default]
    Invalidate,
    /// Collisions are reported but do not affect validity
    Advisory,
}

/// Configuration for index building, recovery and validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Entry that must exist at the top level of the archive
    pub root_entry: String,

    /// Entry name of the embedded index
    pub reserved_entry: String,

    /// Older embedded index names, excluded from indexing like `reserved_entry`
    pub legacy_reserved_entries: Vec<String>,

    /// Effect of key collisions on validity
    pub collision_policy: CollisionPolicy,

    /// Replace existing output files
    pub overwrite: bool,

    /// Initial size of the trailing window read when bootstrapping (bytes)
    pub trailer_window: usize,

    /// Upper bound for the trailing window after adaptive growth (bytes)
    pub max_trailer_window: usize,

    /// Extra-field allowance for the local header read (bytes)
    pub local_header_slack: usize,

    /// Maximum number of skipped report entries, unlimited when `None`
    pub max_report_drift: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root_entry: DEFAULT_ROOT_ENTRY.to_string(),
            reserved_entry: DEFAULT_RESERVED_ENTRY.to_string(),
            legacy_reserved_entries: vec![LEGACY_RESERVED_ENTRY.to_string()],
            collision_policy: CollisionPolicy::default(),
            overwrite: false,
            trailer_window: 1024,
            max_trailer_window: MAX_TRAILER_SIZE,
            local_header_slack: 64,
            max_report_drift: None,
        }
    }
}

impl IndexConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the required root entry name
    #[must_use]
    pub fn with_root_entry(mut self, name: impl Into<String>) -> Self {
        self.root_entry = name.into();
        self
    }

    /// Set the reserved index entry name
    #[must_use]
    pub fn with_reserved_entry(mut self, name: impl Into<String>) -> Self {
        self.reserved_entry = name.into();
        self
    }

    /// Set the collision policy
    #[must_use]
    pub const fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Allow or refuse overwriting existing outputs
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the initial trailing window size
    #[must_use]
    pub const fn with_trailer_window(mut self, size: usize) -> Self {
        self.trailer_window = size;
        self
    }

    /// Set the local header slack
    #[must_use]
    pub const fn with_local_header_slack(mut self, slack: usize) -> Self {
        self.local_header_slack = slack;
        self
    }

    /// Limit the number of skipped report entries
    #[must_use]
    pub const fn with_max_report_drift(mut self, limit: Option<usize>) -> Self {
        self.max_report_drift = limit;
        self
    }

    /// Check whether an entry name is the embedded index (current or legacy)
    pub fn is_reserved(&self, name: &str) -> bool {
        name == self.reserved_entry || self.legacy_reserved_entries.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert_eq!(config.root_entry, "tileset.json");
        assert_eq!(config.reserved_entry, "@3dtilesIndex1@");
        assert_eq!(config.collision_policy, CollisionPolicy::Invalidate);
        assert!(!config.overwrite);
        assert!(config.trailer_window <= config.max_trailer_window);
    }

    #[test]
    fn test_reserved_names() {
        let config = IndexConfig::default();
        assert!(config.is_reserved("@3dtilesIndex1@"));
        assert!(config.is_reserved("@specialIndexFileHASH128@"));
        assert!(!config.is_reserved("tileset.json"));

        let custom = IndexConfig::new().with_reserved_entry("@custom@");
        assert!(custom.is_reserved("@custom@"));
        assert!(!custom.is_reserved("@3dtilesIndex1@"));
    }

    #[test]
    fn test_builder_methods() {
        let config = IndexConfig::new()
            .with_overwrite(true)
            .with_collision_policy(CollisionPolicy::Advisory)
            .with_trailer_window(64)
            .with_max_report_drift(Some(3));
        assert!(config.overwrite);
        assert_eq!(config.collision_policy, CollisionPolicy::Advisory);
        assert_eq!(config.trailer_window, 64);
        assert_eq!(config.max_report_drift, Some(3));
    }
}
