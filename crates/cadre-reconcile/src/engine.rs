//! The reconciliation engine: fetch, classify, apply, re-fetch.

use cadre_core::{Entity, EntitySet};
use cadre_remote::{RemoteCollection, RemoteResult};
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::failure::{
    AggregateFailure, EntityFailure, OperationKind, ReconcileError, ReconcileResult,
};
use crate::plan::Plan;

/// How a pass applies its buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// One operation at a time, left-to-right in bucket order. The first
    /// failure aborts the remaining work in the pass.
    Sequential,
    /// Up to `max_in_flight` operations at once. All dispatched work is
    /// awaited; failures are aggregated, naming every failing entity.
    Concurrent { max_in_flight: usize },
}

/// Converges a remote collection to match a declared collection.
///
/// The engine is stateless between passes: each call is given a fresh
/// desired set and reads the observed set itself. Re-running with an
/// unchanged desired state issues the single read plus the update calls for
/// entities present on both sides (bucketing is identity-only, see
/// [`Plan`]), and no adds or removes.
pub struct Reconciler {
    policy: ExecutionPolicy,
}

impl Reconciler {
    /// Create an engine with the given execution policy.
    #[must_use]
    pub fn new(policy: ExecutionPolicy) -> Self {
        let policy = match policy {
            ExecutionPolicy::Concurrent { max_in_flight } => ExecutionPolicy::Concurrent {
                max_in_flight: max_in_flight.max(1),
            },
            sequential => sequential,
        };
        Self { policy }
    }

    /// Sequential fail-fast engine.
    #[must_use]
    pub fn sequential() -> Self {
        Self::new(ExecutionPolicy::Sequential)
    }

    /// Bounded-concurrent engine with failure aggregation.
    #[must_use]
    pub fn concurrent(max_in_flight: usize) -> Self {
        Self::new(ExecutionPolicy::Concurrent { max_in_flight })
    }

    /// The configured execution policy.
    #[must_use]
    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    /// Run one reconciliation pass and return the converged observed state.
    ///
    /// Steps: fetch the observed set; classify into add/update/remove
    /// buckets; apply adds and updates, then removes; fetch again. The
    /// second fetch is authoritative: remote-side defaults and validation
    /// may have altered entities during add/update, so the returned set is
    /// what the remote actually holds, not an approximation assembled from
    /// the inputs.
    pub async fn reconcile<T, R>(
        &self,
        desired: &EntitySet<T>,
        remote: &R,
    ) -> ReconcileResult<EntitySet<T>>
    where
        T: Entity + Clone + Send + Sync,
        R: RemoteCollection<T>,
    {
        let observed = fetch_set(remote).await?;
        debug!(observed = observed.len(), "fetched current remote state");

        let plan = Plan::compute(desired, &observed);
        let summary = plan.summary();
        debug!(
            add = summary.add,
            update = summary.update,
            remove = summary.remove,
            "computed reconciliation plan"
        );

        match self.policy {
            ExecutionPolicy::Sequential => {
                // Add-then-update, in that sequence, then removes last, so a
                // failure never leaves declared entities removed without
                // their replacements having been attempted.
                apply_sequential(remote, &plan.to_add, OperationKind::Add).await?;
                apply_sequential(remote, &plan.to_update, OperationKind::Update).await?;
                apply_sequential(remote, &plan.to_remove, OperationKind::Remove).await?;
            }
            ExecutionPolicy::Concurrent { max_in_flight } => {
                let upserts: Vec<(OperationKind, &T)> = plan
                    .to_add
                    .iter()
                    .map(|e| (OperationKind::Add, e))
                    .chain(plan.to_update.iter().map(|e| (OperationKind::Update, e)))
                    .collect();
                let failures = apply_concurrent(remote, upserts, max_in_flight).await;
                if !failures.is_empty() {
                    return Err(AggregateFailure::new(failures).into());
                }

                let removals: Vec<(OperationKind, &T)> = plan
                    .to_remove
                    .iter()
                    .map(|e| (OperationKind::Remove, e))
                    .collect();
                let failures = apply_concurrent(remote, removals, max_in_flight).await;
                if !failures.is_empty() {
                    return Err(AggregateFailure::new(failures).into());
                }
            }
        }

        info!(
            added = summary.add,
            updated = summary.update,
            removed = summary.remove,
            "reconciliation pass completed"
        );

        fetch_set(remote).await
    }
}

/// Fetch the remote listing and validate the one-entity-per-identity
/// contract.
async fn fetch_set<T, R>(remote: &R) -> ReconcileResult<EntitySet<T>>
where
    T: Entity + Send + Sync,
    R: RemoteCollection<T>,
{
    let listing = remote
        .fetch()
        .await
        .map_err(|source| ReconcileError::Fetch { source })?;
    EntitySet::try_from_vec(listing).map_err(|source| ReconcileError::Observed { source })
}

async fn dispatch<T, R>(remote: &R, kind: OperationKind, entity: &T) -> RemoteResult<()>
where
    T: Entity + Send + Sync,
    R: RemoteCollection<T>,
{
    match kind {
        OperationKind::Add => remote.add(entity).await,
        OperationKind::Update => remote.update(entity).await,
        OperationKind::Remove => remote.remove(entity).await,
    }
}

/// Apply one bucket left-to-right, failing fast on the first error.
///
/// A not-found answer to a remove means the entity was already deleted
/// out-of-band; that is a converged outcome, not a failure.
async fn apply_sequential<T, R>(
    remote: &R,
    bucket: &EntitySet<T>,
    kind: OperationKind,
) -> ReconcileResult<()>
where
    T: Entity + Send + Sync,
    R: RemoteCollection<T>,
{
    for entity in bucket {
        match dispatch(remote, kind, entity).await {
            Ok(()) => {}
            Err(err) if kind == OperationKind::Remove && err.is_not_found() => {
                debug!(
                    entity = entity.id(),
                    "entity already absent on remote, treating removal as success"
                );
            }
            Err(source) => {
                return Err(EntityFailure {
                    entity_id: entity.id().to_string(),
                    kind,
                    source,
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Apply operations with bounded concurrency, collecting every failure.
async fn apply_concurrent<T, R>(
    remote: &R,
    ops: Vec<(OperationKind, &T)>,
    max_in_flight: usize,
) -> Vec<EntityFailure>
where
    T: Entity + Send + Sync,
    R: RemoteCollection<T>,
{
    stream::iter(ops)
        .map(|(kind, entity)| async move {
            match dispatch(remote, kind, entity).await {
                Ok(()) => None,
                Err(err) if kind == OperationKind::Remove && err.is_not_found() => {
                    debug!(
                        entity = entity.id(),
                        "entity already absent on remote, treating removal as success"
                    );
                    None
                }
                Err(source) => Some(EntityFailure {
                    entity_id: entity.id().to_string(),
                    kind,
                    source,
                }),
            }
        })
        .buffer_unordered(max_in_flight)
        .filter_map(|outcome| async move { outcome })
        .collect()
        .await
}
