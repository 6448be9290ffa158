use crate::config::TriageConfig;
use crate::core::labels::LabelScanner;
use crate::core::paginate::cancellable;
use crate::core::repos::RepositoryEnumerator;
use crate::core::resolver::QueryResolver;
use crate::domain::model::{ColumnTarget, RepositoryScan, ScanReport};
use crate::domain::ports::{Assigner, IssueTracker, ProjectDirectory};
use crate::utils::error::Result;
use tokio_util::sync::CancellationToken;

/// Runs one org-wide scan: resolve the board, walk every repository, hand each
/// labelled item to the assigner. Strictly sequential; the first error ends
/// the run.
pub struct Orchestrator<D: ProjectDirectory, T: IssueTracker, A: Assigner> {
    config: TriageConfig,
    directory: D,
    tracker: T,
    assigner: A,
}

impl<D: ProjectDirectory, T: IssueTracker, A: Assigner> Orchestrator<D, T, A> {
    pub fn new(config: TriageConfig, directory: D, tracker: T, assigner: A) -> Self {
        Self {
            config,
            directory,
            tracker,
            assigner,
        }
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<ScanReport> {
        let config = &self.config;
        let org = config.org.as_str();

        let resolver = QueryResolver::new(&self.directory);
        let project_id = resolver
            .resolve_project_id(org, &config.project, cancel)
            .await?;
        let column = resolver
            .resolve_column(&project_id, &config.column, cancel)
            .await?;
        let target = ColumnTarget::new(project_id.clone(), &column);

        let repositories = RepositoryEnumerator::new(&self.tracker, config.page_size)
            .list_repositories(org, cancel)
            .await?;

        let scanner = LabelScanner::new(&self.tracker, config.page_size).with_state(config.state);
        let mut scans = Vec::with_capacity(repositories.len());
        let mut assigned = 0;

        for repository in repositories {
            tracing::info!("Looking for issues and PRs in {}/{}", org, repository.name);
            let items = scanner
                .scan(org, &repository.name, &config.labels, cancel)
                .await?;

            for item in &items {
                cancellable(
                    cancel,
                    self.assigner.assign(&target, &item.node_id, item.kind()),
                )
                .await?;
                assigned += 1;
            }

            let scan = RepositoryScan {
                repository: repository.name,
                items,
            };
            tracing::info!(
                "Found {} in {}/{} ({} issues, {} pull requests)",
                scan.items.len(),
                org,
                scan.repository,
                scan.issue_count(),
                scan.pull_request_count()
            );
            scans.push(scan);
        }

        let report = ScanReport {
            project_id,
            column,
            repositories: scans,
            assigned,
        };
        tracing::info!(
            "Scanned {} repositories in {}: {} matching items",
            report.repositories.len(),
            org,
            report.total_matched()
        );
        Ok(report)
    }
}
