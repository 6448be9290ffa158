use crate::config::toml_config::TomlConfig;
use crate::config::{GithubSettings, TriageConfig};
use crate::domain::model::IssueState;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "project-triage")]
#[command(about = "Find labelled issues and pull requests across an organization and file them into a project column")]
pub struct CliArgs {
    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Organization login
    #[arg(long)]
    pub org: Option<String>,

    /// Project title (exact, case-sensitive)
    #[arg(long)]
    pub project: Option<String>,

    /// Option of the project's Status field to file items into
    #[arg(long)]
    pub column: Option<String>,

    /// Label every matched item must carry (repeatable)
    #[arg(short, long = "label")]
    pub labels: Vec<String>,

    /// Items requested per page (1-100)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Issue state filter: open, closed or all
    #[arg(long)]
    pub state: Option<IssueState>,

    /// Add matched items to the project instead of only reporting them
    #[arg(long)]
    pub assign: bool,

    #[arg(long)]
    pub api_url: Option<String>,

    #[arg(long)]
    pub graphql_url: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    /// Builds the effective settings: flags override the file, the file
    /// overrides the defaults.
    pub fn resolve(&self) -> Result<(TriageConfig, GithubSettings)> {
        let file = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        let (mut triage, mut github) = file.into_settings();
        self.apply_overrides(&mut triage, &mut github);
        Ok((triage, github))
    }

    fn apply_overrides(&self, triage: &mut TriageConfig, github: &mut GithubSettings) {
        if let Some(org) = &self.org {
            triage.org = org.clone();
        }
        if let Some(project) = &self.project {
            triage.project = project.clone();
        }
        if let Some(column) = &self.column {
            triage.column = column.clone();
        }
        if !self.labels.is_empty() {
            triage.labels = self.labels.clone();
        }
        if let Some(page_size) = self.page_size {
            triage.page_size = page_size;
        }
        if let Some(state) = self.state {
            triage.state = state;
        }
        if self.assign {
            triage.assign = true;
        }

        if let Some(api_url) = &self.api_url {
            github.api_url = api_url.clone();
        }
        if let Some(graphql_url) = &self.graphql_url {
            github.graphql_url = graphql_url.clone();
        }
        if let Some(token) = &self.token {
            github.token = Some(token.clone());
        }
        if let Some(timeout) = self.timeout_secs {
            github.timeout_secs = Some(timeout);
        }
    }
}
