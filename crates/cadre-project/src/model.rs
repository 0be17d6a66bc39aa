//! The declared state of one project.

use cadre_core::{CoreResult, EntitySet};
use serde::{Deserialize, Serialize};

use crate::member::{Member, MemberKind};
use crate::repository::RepositoryAttachment;
use crate::role::Role;

/// Declarative description of a project's governed sub-resources.
///
/// Parsed from the host plugin's configuration. Each accessor builds the
/// corresponding desired [`EntitySet`], rejecting duplicate identities
/// before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Project key the sub-resources belong to.
    pub key: String,
    /// Declared user members.
    #[serde(default)]
    pub users: Vec<Member>,
    /// Declared group members.
    #[serde(default)]
    pub groups: Vec<Member>,
    /// Declared roles.
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Keys of repositories that belong to the project.
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl ProjectManifest {
    /// A manifest with the given key and nothing declared.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            users: Vec::new(),
            groups: Vec::new(),
            roles: Vec::new(),
            repositories: Vec::new(),
        }
    }

    /// Desired membership set for one kind.
    pub fn desired_members(&self, kind: MemberKind) -> CoreResult<EntitySet<Member>> {
        let members = match kind {
            MemberKind::User => &self.users,
            MemberKind::Group => &self.groups,
        };
        EntitySet::try_from_iter(members.iter().cloned())
    }

    /// Desired role set.
    pub fn desired_roles(&self) -> CoreResult<EntitySet<Role>> {
        EntitySet::try_from_iter(self.roles.iter().cloned())
    }

    /// Desired repository-attachment set.
    pub fn desired_repositories(&self) -> CoreResult<EntitySet<RepositoryAttachment>> {
        EntitySet::try_from_iter(
            self.repositories
                .iter()
                .map(|key| RepositoryAttachment::new(key.clone())),
        )
    }
}
