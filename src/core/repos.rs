use crate::core::paginate::collect_all;
use crate::domain::model::Repository;
use crate::domain::ports::IssueTracker;
use crate::utils::error::Result;
use tokio_util::sync::CancellationToken;

/// Lists every repository of an organization, in server order.
pub struct RepositoryEnumerator<'a, T: IssueTracker + ?Sized> {
    tracker: &'a T,
    page_size: u32,
}

impl<'a, T: IssueTracker + ?Sized> RepositoryEnumerator<'a, T> {
    pub fn new(tracker: &'a T, page_size: u32) -> Self {
        Self { tracker, page_size }
    }

    pub async fn list_repositories(
        &self,
        org: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Repository>> {
        let repos = collect_all(self.page_size, cancel, |page| {
            self.tracker.list_org_repositories(org, page)
        })
        .await?;

        tracing::info!("Organization {} has {} repositories", org, repos.len());
        Ok(repos)
    }
}
