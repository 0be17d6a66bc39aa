//! Reconciliation error types
//!
//! Every failure names the entity and operation it belongs to; aggregated
//! failures name every failing entity and never a succeeded one.

use std::fmt;

use cadre_core::CoreError;
use cadre_remote::RemoteError;
use thiserror::Error;

/// The remote operation a bucket entry maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Add,
    Update,
    Remove,
}

impl OperationKind {
    /// Lowercase verb used in error messages and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Update => "update",
            OperationKind::Remove => "remove",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named entity's operation failed.
#[derive(Debug, Error)]
#[error("failed to {kind} '{entity_id}': {source}")]
pub struct EntityFailure {
    /// Identity key of the entity whose operation failed.
    pub entity_id: String,
    /// Which operation was being applied.
    pub kind: OperationKind,
    /// The underlying remote error.
    #[source]
    pub source: RemoteError,
}

/// Composite failure from a concurrently applied bucket.
///
/// Holds at least one [`EntityFailure`]; callers must not assume any fixed
/// maximum count.
#[derive(Debug)]
pub struct AggregateFailure {
    failures: Vec<EntityFailure>,
}

impl AggregateFailure {
    /// Wrap a non-empty list of failures.
    #[must_use]
    pub fn new(failures: Vec<EntityFailure>) -> Self {
        debug_assert!(!failures.is_empty(), "aggregate of zero failures");
        Self { failures }
    }

    /// The individual failures, in completion order.
    #[must_use]
    pub fn failures(&self) -> &[EntityFailure] {
        &self.failures
    }

    /// Number of failed operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Never true for a constructed aggregate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the aggregate names the given entity.
    #[must_use]
    pub fn names(&self, entity_id: &str) -> bool {
        self.failures.iter().any(|f| f.entity_id == entity_id)
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} operation(s) failed: ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

/// Error from one reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Could not obtain the observed state; no partial progress was made.
    #[error("failed to fetch current state: {source}")]
    Fetch {
        #[source]
        source: RemoteError,
    },

    /// The remote listing violated the one-entity-per-identity contract.
    #[error("remote listing violated the identity contract: {source}")]
    Observed {
        #[source]
        source: CoreError,
    },

    /// A sequential-mode operation failed; remaining same-bucket work was
    /// aborted.
    #[error(transparent)]
    Operation(#[from] EntityFailure),

    /// One or more concurrent-mode operations failed; all dispatched work
    /// was awaited before reporting.
    #[error(transparent)]
    Aggregate(#[from] AggregateFailure),
}

/// Result type for reconciliation passes.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
