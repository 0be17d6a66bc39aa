//! Bucket classification of declared vs observed entity sets.

use cadre_core::{Entity, EntitySet};

/// The three buckets one reconciliation pass will apply.
///
/// Bucketing is identity-only: an entity present in both sets always lands in
/// `to_update`, even when its payloads are byte-identical on both sides. The
/// remote APIs this engine targets are idempotent on update, and skipping
/// "unchanged" entities would require payload equality semantics the identity
/// contract deliberately does not define.
#[derive(Debug, Clone)]
pub struct Plan<T> {
    /// Declared but not observed: to be created remotely.
    pub to_add: EntitySet<T>,
    /// Declared and observed: the declared payload is pushed remotely.
    pub to_update: EntitySet<T>,
    /// Observed but not declared: to be deleted remotely.
    pub to_remove: EntitySet<T>,
}

impl<T: Entity + Clone> Plan<T> {
    /// Classify `desired` against `observed`.
    ///
    /// The buckets partition the union of both sets by identity: each
    /// identity appears in exactly one bucket.
    #[must_use]
    pub fn compute(desired: &EntitySet<T>, observed: &EntitySet<T>) -> Self {
        Self {
            to_add: desired.difference(observed),
            to_update: desired.intersection(observed),
            to_remove: observed.difference(desired),
        }
    }

    /// Per-bucket counts, for logging and reporting.
    #[must_use]
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            add: self.to_add.len(),
            update: self.to_update.len(),
            remove: self.to_remove.len(),
        }
    }

    /// Whether the pass has nothing to apply.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
    }
}

/// Bucket counts from one computed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanSummary {
    pub add: usize,
    pub update: usize,
    pub remove: usize,
}

impl PlanSummary {
    /// Total operations the plan would issue.
    #[must_use]
    pub fn total(&self) -> usize {
        self.add + self.update + self.remove
    }
}
