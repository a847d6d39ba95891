//! Dedup and cutoff policy
//!
//! Guards against feeds that re-serve nodes instead of terminating, and
//! enforces a caller-supplied lower time bound on time-ordered feeds.

use super::types::Item;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Why the policy ended a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The id was already accumulated
    Duplicate(String),
    /// The item predates the minimum timestamp
    BeforeCutoff(DateTime<Utc>),
}

/// Per-walk stop policy
#[derive(Debug, Clone, Default)]
pub struct StopPolicy {
    seen: HashSet<String>,
    min_timestamp: Option<DateTime<Utc>>,
}

impl StopPolicy {
    /// Policy with duplicate detection and an optional cutoff
    pub fn new(min_timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            seen: HashSet::new(),
            min_timestamp,
        }
    }

    /// Policy with duplicate detection only (relational feeds)
    pub fn dedup_only() -> Self {
        Self::new(None)
    }

    /// Check an item, recording its id when it may be kept
    pub fn check<T: Item + ?Sized>(&mut self, item: &T) -> Option<StopReason> {
        let id = item.id();
        if self.seen.contains(&id) {
            return Some(StopReason::Duplicate(id));
        }
        if let (Some(min), Some(created)) = (self.min_timestamp, item.created_at()) {
            if created < min {
                return Some(StopReason::BeforeCutoff(created));
            }
        }
        self.seen.insert(id);
        None
    }

    /// `true` when the walk must stop before `item`
    pub fn should_stop<T: Item + ?Sized>(&mut self, item: &T) -> bool {
        self.check(item).is_some()
    }

    /// Number of ids recorded
    pub fn seen(&self) -> usize {
        self.seen.len()
    }
}
