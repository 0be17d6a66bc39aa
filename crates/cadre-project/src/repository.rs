//! Repository attachments and their remote collection.

use async_trait::async_trait;
use cadre_core::Entity;
use cadre_remote::{RemoteCollection, RemoteResult};
use serde::{Deserialize, Serialize};

use crate::api::ProjectApi;

/// A repository attached to a project.
///
/// The attachment carries no mutable payload: a repository either belongs to
/// the project or it does not, so the identity key is the whole entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryAttachment {
    /// Key of the attached repository.
    pub repo_key: String,
}

impl RepositoryAttachment {
    /// Attachment of the repository with the given key.
    pub fn new(repo_key: impl Into<String>) -> Self {
        Self {
            repo_key: repo_key.into(),
        }
    }
}

impl Entity for RepositoryAttachment {
    fn id(&self) -> &str {
        &self.repo_key
    }
}

/// The repository attachments of one project, as a remote collection.
///
/// Attach is idempotent on the remote side, so it serves the update bucket
/// too; there is no payload an update could change.
pub struct RepositoryCollection<'a, A: ?Sized> {
    api: &'a A,
    project: &'a str,
}

impl<'a, A: ?Sized> RepositoryCollection<'a, A> {
    /// Attachments of `project`, served by `api`.
    pub fn new(api: &'a A, project: &'a str) -> Self {
        Self { api, project }
    }
}

#[async_trait]
impl<'a, A: ProjectApi + ?Sized> RemoteCollection<RepositoryAttachment>
    for RepositoryCollection<'a, A>
{
    async fn fetch(&self) -> RemoteResult<Vec<RepositoryAttachment>> {
        self.api.list_repositories(self.project).await
    }

    async fn add(&self, entity: &RepositoryAttachment) -> RemoteResult<()> {
        self.api
            .attach_repository(self.project, &entity.repo_key)
            .await
    }

    async fn update(&self, entity: &RepositoryAttachment) -> RemoteResult<()> {
        self.add(entity).await
    }

    async fn remove(&self, entity: &RepositoryAttachment) -> RemoteResult<()> {
        self.api
            .detach_repository(self.project, &entity.repo_key)
            .await
    }
}
