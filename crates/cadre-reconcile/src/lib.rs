//! # Cadre Reconcile
//!
//! The generic desired-vs-observed reconciliation engine.
//!
//! One engine serves every reconciled resource. A pass:
//!
//! 1. Fetches the observed remote state through a
//!    [`RemoteCollection`](cadre_remote::RemoteCollection).
//! 2. Classifies entities by identity into three buckets ([`Plan`]):
//!    `to_add` (declared, not observed), `to_update` (declared and observed,
//!    always updated, payload differences never checked), `to_remove`
//!    (observed, not declared).
//! 3. Applies adds and updates, then removes, under the chosen
//!    [`ExecutionPolicy`]: sequential fail-fast or bounded-concurrent with
//!    failure aggregation. A not-found answer to a remove is success: the
//!    entity is already gone.
//! 4. Fetches again and returns the authoritative converged state.
//!
//! Add/update runs before remove so that a failure partway through a pass
//! never leaves declared entities removed without their replacements having
//! been attempted.
//!
//! The engine holds no timeout and no retry logic of its own; those are the
//! caller's and the collaborator decorators' concerns. Every await point is
//! drop-cancellable.

pub mod engine;
pub mod failure;
pub mod plan;

pub use engine::{ExecutionPolicy, Reconciler};
pub use failure::{
    AggregateFailure, EntityFailure, OperationKind, ReconcileError, ReconcileResult,
};
pub use plan::{Plan, PlanSummary};
