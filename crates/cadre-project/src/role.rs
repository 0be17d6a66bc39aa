//! Project roles and their remote collection.

use async_trait::async_trait;
use cadre_core::Entity;
use cadre_remote::{RemoteCollection, RemoteResult};
use serde::{Deserialize, Serialize};

use crate::api::ProjectApi;

/// A project role: a named grant of actions over a set of environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role name, the identity key within one project.
    pub name: String,
    /// Role classification as the remote API understands it.
    #[serde(default = "Role::default_type")]
    pub role_type: String,
    /// Actions the role grants.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Environments the grant applies to.
    #[serde(default)]
    pub environments: Vec<String>,
}

impl Role {
    /// Create a custom role.
    pub fn new(name: impl Into<String>, actions: Vec<String>, environments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            role_type: Self::default_type(),
            actions,
            environments,
        }
    }

    fn default_type() -> String {
        "CUSTOM".to_string()
    }
}

impl Entity for Role {
    fn id(&self) -> &str {
        &self.name
    }
}

/// The roles of one project, as a remote collection.
pub struct RoleCollection<'a, A: ?Sized> {
    api: &'a A,
    project: &'a str,
}

impl<'a, A: ?Sized> RoleCollection<'a, A> {
    /// Roles of `project`, served by `api`.
    pub fn new(api: &'a A, project: &'a str) -> Self {
        Self { api, project }
    }
}

#[async_trait]
impl<'a, A: ProjectApi + ?Sized> RemoteCollection<Role> for RoleCollection<'a, A> {
    async fn fetch(&self) -> RemoteResult<Vec<Role>> {
        self.api.list_roles(self.project).await
    }

    async fn add(&self, entity: &Role) -> RemoteResult<()> {
        self.api.create_role(self.project, entity).await
    }

    async fn update(&self, entity: &Role) -> RemoteResult<()> {
        self.api.update_role(self.project, entity).await
    }

    async fn remove(&self, entity: &Role) -> RemoteResult<()> {
        self.api.delete_role(self.project, &entity.name).await
    }
}
