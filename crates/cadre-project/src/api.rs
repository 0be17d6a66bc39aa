//! The remote API boundary implemented by the host plugin.

use async_trait::async_trait;
use cadre_remote::RemoteResult;

use crate::member::{Member, MemberKind};
use crate::repository::RepositoryAttachment;
use crate::role::Role;

/// Remote project-governance API surface.
///
/// The host plugin implements this against its HTTP client; the adapters in
/// this crate turn each resource into a
/// [`RemoteCollection`](cadre_remote::RemoteCollection) the engine can drive.
///
/// Contract notes, mirrored from the collection trait:
///
/// - Listings return one entity per identity; duplicates are the
///   implementor's to normalize.
/// - Deletions should treat an already-absent resource as success; the
///   engine also normalizes a [`NotFound`] answer on removal paths, so
///   implementations may simply pass the status through.
///
/// [`NotFound`]: cadre_remote::RemoteError::NotFound
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// List the members of `project` for one membership kind.
    async fn list_members(&self, project: &str, kind: MemberKind) -> RemoteResult<Vec<Member>>;

    /// Create or replace one member of `project`. The remote endpoint
    /// upserts, so this serves both the add and update buckets.
    async fn put_member(&self, project: &str, kind: MemberKind, member: &Member)
        -> RemoteResult<()>;

    /// Remove one member from `project`.
    async fn delete_member(&self, project: &str, kind: MemberKind, name: &str)
        -> RemoteResult<()>;

    /// List the roles of `project`.
    async fn list_roles(&self, project: &str) -> RemoteResult<Vec<Role>>;

    /// Create one role in `project`.
    async fn create_role(&self, project: &str, role: &Role) -> RemoteResult<()>;

    /// Replace an existing role of `project` with the declared payload.
    async fn update_role(&self, project: &str, role: &Role) -> RemoteResult<()>;

    /// Delete one role from `project`.
    async fn delete_role(&self, project: &str, name: &str) -> RemoteResult<()>;

    /// List the repositories attached to `project`.
    async fn list_repositories(&self, project: &str) -> RemoteResult<Vec<RepositoryAttachment>>;

    /// Attach one repository to `project`. Idempotent: attaching an
    /// already-attached repository succeeds.
    async fn attach_repository(&self, project: &str, repo_key: &str) -> RemoteResult<()>;

    /// Detach one repository from `project`.
    async fn detach_repository(&self, project: &str, repo_key: &str) -> RemoteResult<()>;
}
