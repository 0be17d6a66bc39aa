//! # Cadre Project
//!
//! Project-governance adapters over the cadre reconciliation engine.
//!
//! A project declares four remote collections: user members, group members,
//! roles, and repository attachments. Each is a thin instantiation of the
//! same generic engine; only the entity type and the remote calls differ.
//! The [`ProjectReconciler`] orchestrates all four in dependency order:
//! roles first (member role references require the roles to exist), then
//! user and group members, repositories last.
//!
//! The remote side is abstracted as [`ProjectApi`], implemented by the host
//! plugin; this crate never constructs HTTP clients or templates URLs.

pub mod api;
pub mod converge;
pub mod member;
pub mod model;
pub mod repository;
pub mod role;

pub use api::ProjectApi;
pub use converge::{
    default_repository_limits, ConvergeError, ConvergeReport, ProjectReconciler, ResourceKind,
    REPO_ATTACH_BUCKET, REPO_DETACH_BUCKET,
};
pub use member::{Member, MemberKind, MembershipCollection};
pub use model::ProjectManifest;
pub use repository::{RepositoryAttachment, RepositoryCollection};
pub use role::{Role, RoleCollection};
