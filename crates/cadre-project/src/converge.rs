//! Project-level convergence: all four collections in dependency order.

use std::fmt;
use std::sync::Arc;

use cadre_core::{CoreError, EntitySet};
use cadre_remote::{RateLimit, RateLimiterRegistry, RetryPolicy, Throttled};
use cadre_reconcile::{ExecutionPolicy, ReconcileError, Reconciler};
use thiserror::Error;
use tracing::info;

use crate::api::ProjectApi;
use crate::member::{Member, MemberKind, MembershipCollection};
use crate::model::ProjectManifest;
use crate::repository::{RepositoryAttachment, RepositoryCollection};
use crate::role::{Role, RoleCollection};

/// Bucket name throttling repository attach calls.
pub const REPO_ATTACH_BUCKET: &str = "repo.attach";
/// Bucket name throttling repository detach calls.
pub const REPO_DETACH_BUCKET: &str = "repo.detach";

/// The default throttle for repository attach/detach traffic.
///
/// One registry should be shared (via `Arc`) across every project converged
/// by the process, so the throttle is global rather than per-project.
#[must_use]
pub fn default_repository_limits() -> RateLimiterRegistry {
    RateLimiterRegistry::builder()
        .bucket(REPO_ATTACH_BUCKET, RateLimit::per_second(1))
        .bucket(REPO_DETACH_BUCKET, RateLimit::per_second(1))
        .build()
}

/// Which project sub-resource a convergence failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Roles,
    Users,
    Groups,
    Repositories,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Roles => "roles",
            ResourceKind::Users => "user members",
            ResourceKind::Groups => "group members",
            ResourceKind::Repositories => "repository attachments",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from converging one project.
#[derive(Debug, Error)]
pub enum ConvergeError {
    /// The manifest itself is malformed; nothing was sent remotely.
    #[error("invalid project declaration: {0}")]
    Invalid(#[from] CoreError),

    /// One sub-resource failed to converge; later sub-resources in the
    /// dependency order were not attempted.
    #[error("failed to converge {resource} for project '{project}': {source}")]
    Resource {
        project: String,
        resource: ResourceKind,
        #[source]
        source: ReconcileError,
    },
}

impl ConvergeError {
    fn resource(project: &str, resource: ResourceKind, source: ReconcileError) -> Self {
        ConvergeError::Resource {
            project: project.to_string(),
            resource,
            source,
        }
    }
}

/// The authoritative remote state after a successful convergence pass.
#[derive(Debug)]
pub struct ConvergeReport {
    pub roles: EntitySet<Role>,
    pub users: EntitySet<Member>,
    pub groups: EntitySet<Member>,
    pub repositories: EntitySet<RepositoryAttachment>,
}

/// Converges every governed sub-resource of a project.
///
/// Resources run in dependency order: roles first, because member role
/// references require the roles to exist; repositories last, behind the
/// attach/detach throttle. The first resource-level failure aborts the pass;
/// the next pass picks up from whatever state the remote is actually in.
pub struct ProjectReconciler {
    engine: Reconciler,
    limiters: Arc<RateLimiterRegistry>,
    retry: RetryPolicy,
}

impl ProjectReconciler {
    /// Create a project reconciler with the default repository throttle and
    /// retry policy.
    #[must_use]
    pub fn new(policy: ExecutionPolicy) -> Self {
        Self {
            engine: Reconciler::new(policy),
            limiters: Arc::new(default_repository_limits()),
            retry: RetryPolicy::default(),
        }
    }

    /// Share a rate-limiter registry with other reconcilers in the process.
    #[must_use]
    pub fn with_limiters(mut self, limiters: Arc<RateLimiterRegistry>) -> Self {
        self.limiters = limiters;
        self
    }

    /// Override the retry policy applied to throttled operations.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Converge the remote project to match `manifest`.
    pub async fn converge<A: ProjectApi>(
        &self,
        manifest: &ProjectManifest,
        api: &A,
    ) -> Result<ConvergeReport, ConvergeError> {
        let project = manifest.key.as_str();

        // Validate the whole declaration up front: a malformed section must
        // be rejected before any remote call, not after earlier sections
        // have already been applied.
        let desired_roles = manifest.desired_roles()?;
        let desired_users = manifest.desired_members(MemberKind::User)?;
        let desired_groups = manifest.desired_members(MemberKind::Group)?;
        let desired_repositories = manifest.desired_repositories()?;

        info!(project, roles = desired_roles.len(), "reconciling project roles");
        let roles = self
            .engine
            .reconcile(&desired_roles, &RoleCollection::new(api, project))
            .await
            .map_err(|source| ConvergeError::resource(project, ResourceKind::Roles, source))?;

        info!(project, users = desired_users.len(), "reconciling project user members");
        let users = self
            .engine
            .reconcile(
                &desired_users,
                &MembershipCollection::new(api, project, MemberKind::User),
            )
            .await
            .map_err(|source| ConvergeError::resource(project, ResourceKind::Users, source))?;

        info!(project, groups = desired_groups.len(), "reconciling project group members");
        let groups = self
            .engine
            .reconcile(
                &desired_groups,
                &MembershipCollection::new(api, project, MemberKind::Group),
            )
            .await
            .map_err(|source| ConvergeError::resource(project, ResourceKind::Groups, source))?;

        info!(
            project,
            repositories = desired_repositories.len(),
            "reconciling project repository attachments"
        );
        let repositories = self
            .engine
            .reconcile(
                &desired_repositories,
                &Throttled::new(
                    RepositoryCollection::new(api, project),
                    self.limiters.clone(),
                    self.retry.clone(),
                    REPO_ATTACH_BUCKET,
                    REPO_DETACH_BUCKET,
                ),
            )
            .await
            .map_err(|source| {
                ConvergeError::resource(project, ResourceKind::Repositories, source)
            })?;

        info!(
            project,
            roles = roles.len(),
            users = users.len(),
            groups = groups.len(),
            repositories = repositories.len(),
            "project converged"
        );

        Ok(ConvergeReport {
            roles,
            users,
            groups,
            repositories,
        })
    }
}
