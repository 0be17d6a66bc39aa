//! The collaborator trait the reconciliation engine drives.

use async_trait::async_trait;
use cadre_core::Entity;

use crate::error::RemoteResult;

/// A remote collection of entities the engine can read and converge.
///
/// One implementation exists per reconciled resource (project members, roles,
/// repository attachments), supplied by the host plugin. The engine only ever
/// calls these four operations; transport, authentication, and path
/// templating are the implementor's concern.
///
/// Contract notes:
///
/// - `fetch` must return a fully materialized, deduplicated listing: one
///   entity per identity. A listing with duplicate identities is a contract
///   violation and fails the reconciliation pass.
/// - `remove` should normalize an already-absent resource to success. The
///   engine additionally treats [`RemoteError::NotFound`] from `remove` as
///   success, so either layer may perform the normalization.
/// - For resources with no mutable payload (repository attachments), `update`
///   may delegate to `add`; the attach call is idempotent and serves both.
///
/// All operations are plain futures: dropping them cancels the in-flight
/// work, which is how caller-side timeouts and shutdown propagate.
///
/// [`RemoteError::NotFound`]: crate::error::RemoteError::NotFound
#[async_trait]
pub trait RemoteCollection<T: Entity>: Send + Sync {
    /// Read the current remote state of the collection.
    async fn fetch(&self) -> RemoteResult<Vec<T>>;

    /// Create or attach one entity remotely.
    async fn add(&self, entity: &T) -> RemoteResult<()>;

    /// Modify an already-present entity to match the declared payload.
    async fn update(&self, entity: &T) -> RemoteResult<()>;

    /// Delete or detach one entity.
    async fn remove(&self, entity: &T) -> RemoteResult<()>;
}
