//! Single-pass index validation
//!
//! Every adjacent pair is compared once with the same three-way key order the
//! builder sorts with. A pair where the previous key is greater is an order
//! violation; a pair with equal keys is a collision. All defects are
//! collected so one run reports the complete list.

use crate::config::CollisionPolicy;
use crate::key::PathKey;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::warn;

use super::record::IndexRecord;

/// Two adjacent records out of order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderViolation {
    /// Position of the record that should sort later
    pub position: usize,
    /// Key at `position - 1`
    pub previous: PathKey,
    /// Key at `position`
    pub current: PathKey,
}

/// Two adjacent records sharing a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    /// Position of the first record
    pub first: usize,
    /// Position of the second record
    pub second: usize,
    /// The shared key
    pub key: PathKey,
}

/// Outcome of validating an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of records examined
    pub record_count: usize,
    /// Order violations found
    pub order_violations: Vec<OrderViolation>,
    /// Key collisions found
    pub collisions: Vec<Collision>,
    /// Policy applied to collisions
    pub collision_policy: CollisionPolicy,
}

impl ValidationReport {
    /// Whether the index passes under the report's collision policy
    pub fn is_valid(&self) -> bool {
        self.order_violations.is_empty()
            && (self.collision_policy == CollisionPolicy::Advisory || self.collisions.is_empty())
    }

    /// Total number of defects of either kind
    pub fn defect_count(&self) -> usize {
        self.order_violations.len() + self.collisions.len()
    }
}

/// Validate record order and detect collisions
pub fn validate(records: &[IndexRecord], policy: CollisionPolicy) -> ValidationReport {
    let mut order_violations = Vec::new();
    let mut collisions = Vec::new();

    for (i, pair) in records.windows(2).enumerate() {
        let position = i + 1;
        let previous = pair[0].key;
        let current = pair[1].key;
        match previous.cmp(&current) {
            Ordering::Less => {}
            Ordering::Equal => {
                warn!("Got hash collision at index {i} and {position}");
                collisions.push(Collision {
                    first: i,
                    second: position,
                    key: current,
                });
            }
            Ordering::Greater => {
                warn!(
                    "Wrong sort order: {position}: {current} ({} {}) should be greater than {i}: {previous} ({} {})",
                    current.low(),
                    current.high(),
                    previous.low(),
                    previous.high()
                );
                order_violations.push(OrderViolation {
                    position,
                    previous,
                    current,
                });
            }
        }
    }

    ValidationReport {
        record_count: records.len(),
        order_violations,
        collisions,
        collision_policy: policy,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::index::IndexBuilder;

    fn built_records() -> Vec<IndexRecord> {
        let config = IndexConfig::default();
        let mut builder = IndexBuilder::new(&config);
        builder.add_entry("tileset.json", 0, false);
        for i in 0..200u64 {
            builder.add_entry(&format!("tiles/{i}.pnts"), i * 10 + 10, false);
        }
        builder.finish().expect("build").0.into_records()
    }

    #[test]
    fn test_builder_output_is_valid() {
        let report = validate(&built_records(), CollisionPolicy::Invalidate);
        assert_eq!(report.record_count, 201);
        assert_eq!(report.defect_count(), 0);
        assert!(report.is_valid());
    }

    #[test]
    fn test_swapped_records_are_flagged() {
        let mut records = built_records();
        records.swap(10, 11);
        let report = validate(&records, CollisionPolicy::Invalidate);
        assert!(!report.is_valid());
        assert!(!report.order_violations.is_empty());
        assert_eq!(report.order_violations[0].position, 11);
        assert!(report.collisions.is_empty());
    }

    #[test]
    fn test_reversed_records_report_every_pair() {
        let mut records = built_records();
        records.reverse();
        let report = validate(&records, CollisionPolicy::Invalidate);
        assert_eq!(report.order_violations.len(), records.len() - 1);
    }

    #[test]
    fn test_collision_policy() {
        let key = PathKey::from_path("same");
        let records = vec![
            IndexRecord::new(PathKey::from_path("tileset.json"), 0),
            IndexRecord::new(key, 1),
            IndexRecord::new(key, 2),
        ];
        let mut sorted = records.clone();
        sorted.sort();

        let strict = validate(&sorted, CollisionPolicy::Invalidate);
        assert_eq!(strict.collisions.len(), 1);
        assert!(strict.order_violations.is_empty());
        assert!(!strict.is_valid());

        let advisory = validate(&sorted, CollisionPolicy::Advisory);
        assert_eq!(advisory.collisions.len(), 1);
        assert!(advisory.is_valid());
    }

    #[test]
    fn test_empty_and_singleton_are_valid() {
        assert!(validate(&[], CollisionPolicy::Invalidate).is_valid());
        let one = [IndexRecord::for_path("tileset.json", 0)];
        assert!(validate(&one, CollisionPolicy::Invalidate).is_valid());
    }
}
