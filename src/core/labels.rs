use crate::core::paginate::collect_all;
use crate::domain::model::{Issue, IssueFilter, IssueState};
use crate::domain::ports::IssueTracker;
use crate::utils::error::Result;
use tokio_util::sync::CancellationToken;

/// Lists the issues and pull requests of a repository that carry every
/// requested label.
pub struct LabelScanner<'a, T: IssueTracker + ?Sized> {
    tracker: &'a T,
    page_size: u32,
    state: IssueState,
}

impl<'a, T: IssueTracker + ?Sized> LabelScanner<'a, T> {
    pub fn new(tracker: &'a T, page_size: u32) -> Self {
        Self {
            tracker,
            page_size,
            state: IssueState::default(),
        }
    }

    pub fn with_state(mut self, state: IssueState) -> Self {
        self.state = state;
        self
    }

    pub async fn scan(
        &self,
        owner: &str,
        repo: &str,
        labels: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Issue>> {
        let filter = IssueFilter {
            labels: labels.to_vec(),
            state: self.state,
        };

        let mut items = collect_all(self.page_size, cancel, |page| {
            self.tracker.list_repository_issues(owner, repo, &filter, page)
        })
        .await?;

        // The labels filter is applied server-side; this guards against a
        // listing that returns unfiltered pages.
        let listed = items.len();
        items.retain(|item| item.has_all_labels(labels));
        if items.len() != listed {
            tracing::debug!(
                "{}/{}: dropped {} listed items missing a requested label",
                owner,
                repo,
                listed - items.len()
            );
        }

        Ok(items)
    }
}
