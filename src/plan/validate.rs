//! Structural validation of a topology plan.
//!
//! Everything checked here is a plan-level inconsistency: retrying against
//! the cluster cannot resolve it, so each finding is a hard error carrying
//! the specific offending shard, zone, or range. Coverage gaps are the one
//! exception; a plan may deliberately route only the named portion of the
//! key space, so gaps are surfaced by the advisory verification phase via
//! [`coverage_gaps`] instead of failing validation.

use super::types::{RangeAssignment, RangeKey, TopologyPlan};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("duplicate shard name {0:?}")]
    DuplicateShard(String),
    #[error("duplicate collection name {0:?}")]
    DuplicateCollection(String),
    #[error("duplicate zone name {0:?}")]
    DuplicateZone(String),
    #[error("zone {zone:?} references unknown shard {shard:?}")]
    UnknownShard { zone: String, shard: String },
    #[error("range for {collection:?} references unknown zone {zone:?}")]
    UnknownZone { collection: String, zone: String },
    #[error("range references unknown collection {0:?}")]
    UnknownCollection(String),
    #[error("range {range} has a bound arity of {got}, partition key has {expected} field(s)")]
    ArityMismatch {
        range: String,
        got: usize,
        expected: usize,
    },
    #[error("range {0} is empty or inverted (min must be below max)")]
    EmptyRange(String),
    #[error("range {new} overlaps previously declared range {existing}")]
    Overlap { new: String, existing: String },
}

impl TopologyPlan {
    /// Checks every structural invariant of the plan.
    ///
    /// Returns the first violation found; validation order is deterministic
    /// (shards, collections, zones, then ranges in declaration order).
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut shard_names = HashSet::new();
        for shard in &self.shards {
            if !shard_names.insert(shard.name.as_str()) {
                return Err(PlanError::DuplicateShard(shard.name.clone()));
            }
        }

        let mut collection_names = HashSet::new();
        for collection in &self.collections {
            if !collection_names.insert(collection.name.as_str()) {
                return Err(PlanError::DuplicateCollection(collection.name.clone()));
            }
        }

        let mut zone_names = HashSet::new();
        for zone in &self.zones {
            if !zone_names.insert(zone.name.as_str()) {
                return Err(PlanError::DuplicateZone(zone.name.clone()));
            }
            for member in &zone.member_shards {
                if !shard_names.contains(member.as_str()) {
                    return Err(PlanError::UnknownShard {
                        zone: zone.name.clone(),
                        shard: member.clone(),
                    });
                }
            }
        }

        for range in &self.ranges {
            let Some(collection) = self.collection(&range.collection) else {
                return Err(PlanError::UnknownCollection(range.collection.clone()));
            };
            if !zone_names.contains(range.zone.as_str()) {
                return Err(PlanError::UnknownZone {
                    collection: range.collection.clone(),
                    zone: range.zone.clone(),
                });
            }

            let expected = collection.key.fields().len();
            for key in [&range.min, &range.max] {
                if key.arity() != expected {
                    return Err(PlanError::ArityMismatch {
                        range: range.to_string(),
                        got: key.arity(),
                        expected,
                    });
                }
            }

            if range.min >= range.max {
                return Err(PlanError::EmptyRange(range.to_string()));
            }
        }

        // Pairwise overlap check per collection. Plans are small (a handful
        // of ranges per collection), so quadratic is fine.
        for (i, new) in self.ranges.iter().enumerate() {
            for existing in &self.ranges[..i] {
                if new.overlaps(existing) {
                    return Err(PlanError::Overlap {
                        new: new.to_string(),
                        existing: existing.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Gaps left uncovered by a collection's range assignments.
///
/// Returns the half-open intervals of the key space that no declared range
/// covers, in key order. An empty result means the ordered union of the
/// ranges equals the full key space.
pub fn coverage_gaps(plan: &TopologyPlan, collection: &str) -> Vec<(RangeKey, RangeKey)> {
    let Some(spec) = plan.collection(collection) else {
        return Vec::new();
    };
    let arity = spec.key.fields().len();
    let ranges = plan.ranges_for(collection);

    let mut gaps = Vec::new();
    let mut cursor = RangeKey::min(arity);
    for range in &ranges {
        if range.min > cursor {
            gaps.push((cursor.clone(), range.min.clone()));
        }
        if range.max > cursor {
            cursor = range.max.clone();
        }
    }
    let end = RangeKey::max(arity);
    if cursor < end {
        gaps.push((cursor, end));
    }
    gaps
}

/// Convenience overlap scan used by property tests: first conflicting pair
/// among a set of assignments, if any.
pub fn first_overlap<'a>(
    ranges: &'a [RangeAssignment],
) -> Option<(&'a RangeAssignment, &'a RangeAssignment)> {
    for (i, new) in ranges.iter().enumerate() {
        for existing in &ranges[..i] {
            if new.overlaps(existing) {
                return Some((existing, new));
            }
        }
    }
    None
}
