//! Project members: user and group membership over one shared adapter.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use cadre_core::{CoreError, Entity};
use cadre_remote::{RemoteCollection, RemoteResult};
use serde::{Deserialize, Serialize};

use crate::api::ProjectApi;

/// A project member: a user or group name with its assigned role names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// User or group name, the identity key within one membership kind.
    pub name: String,
    /// Names of the project roles granted to this member.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Member {
    /// Create a member with the given role names.
    pub fn new(name: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            name: name.into(),
            roles,
        }
    }
}

impl Entity for Member {
    fn id(&self) -> &str {
        &self.name
    }
}

/// Which membership collection a member belongs to.
///
/// Users and groups reconcile against different remote paths but share the
/// same entity shape and the same engine. The kind is validated once at the
/// boundary; downstream code matches on the enum and can never see an
/// unrecognized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    User,
    Group,
}

impl MemberKind {
    /// The remote collection segment for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::User => "users",
            MemberKind::Group => "groups",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(MemberKind::User),
            "groups" => Ok(MemberKind::Group),
            other => Err(CoreError::invalid_input(format!(
                "unknown membership kind '{other}' (expected 'users' or 'groups')"
            ))),
        }
    }
}

/// The user or group membership of one project, as a remote collection.
///
/// `add` and `update` both map to the remote membership PUT; the endpoint
/// upserts, so a single call shape serves both buckets.
pub struct MembershipCollection<'a, A: ?Sized> {
    api: &'a A,
    project: &'a str,
    kind: MemberKind,
}

impl<'a, A: ?Sized> MembershipCollection<'a, A> {
    /// Membership of `project` for the given kind, served by `api`.
    pub fn new(api: &'a A, project: &'a str, kind: MemberKind) -> Self {
        Self { api, project, kind }
    }
}

#[async_trait]
impl<'a, A: ProjectApi + ?Sized> RemoteCollection<Member> for MembershipCollection<'a, A> {
    async fn fetch(&self) -> RemoteResult<Vec<Member>> {
        self.api.list_members(self.project, self.kind).await
    }

    async fn add(&self, entity: &Member) -> RemoteResult<()> {
        self.api.put_member(self.project, self.kind, entity).await
    }

    async fn update(&self, entity: &Member) -> RemoteResult<()> {
        self.api.put_member(self.project, self.kind, entity).await
    }

    async fn remove(&self, entity: &Member) -> RemoteResult<()> {
        self.api
            .delete_member(self.project, self.kind, &entity.name)
            .await
    }
}
