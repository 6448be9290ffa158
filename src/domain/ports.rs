use crate::domain::model::{
    ColumnTarget, ContentKind, Issue, IssueFilter, Page, PageRequest, ProjectField, ProjectId,
    ProjectListing, Repository,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read-only queries against the project graph.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Up to `first` projects of `org`, in server order.
    async fn organization_projects(&self, org: &str, first: u32) -> Result<ProjectListing>;

    /// Up to `first` fields of the project. An unknown ID yields no fields.
    async fn project_fields(&self, project_id: &ProjectId, first: u32) -> Result<Vec<ProjectField>>;
}

/// Paged listings of repositories and their issues.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn list_org_repositories(&self, org: &str, page: PageRequest) -> Result<Page<Repository>>;

    async fn list_repository_issues(
        &self,
        owner: &str,
        repo: &str,
        filter: &IssueFilter,
        page: PageRequest,
    ) -> Result<Page<Issue>>;
}

/// Files one issue or pull request into a project column.
#[async_trait]
pub trait Assigner: Send + Sync {
    async fn assign(&self, target: &ColumnTarget, content_id: &str, kind: ContentKind) -> Result<()>;
}

#[async_trait]
impl<A: Assigner + ?Sized> Assigner for Box<A> {
    async fn assign(&self, target: &ColumnTarget, content_id: &str, kind: ContentKind) -> Result<()> {
        (**self).assign(target, content_id, kind).await
    }
}
