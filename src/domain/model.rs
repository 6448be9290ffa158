use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque Projects-V2 node ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A project as listed under an organization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectNode {
    pub id: ProjectId,
    pub title: String,
}

/// First page of an organization's projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectListing {
    pub projects: Vec<ProjectNode>,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
}

/// A project field projected onto the single-select shape. Fields of any other
/// type arrive with neither ID nor name.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ProjectField {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

/// The `Status` option a scan files items into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusColumn {
    pub field_id: String,
    pub option_id: String,
    pub name: String,
}

/// Everything the assignment mutation needs to place an item in a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTarget {
    pub project_id: ProjectId,
    pub field_id: String,
    pub option_id: String,
}

impl ColumnTarget {
    pub fn new(project_id: ProjectId, column: &StatusColumn) -> Self {
        Self {
            project_id,
            field_id: column.field_id.clone(),
            option_id: column.option_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Repository {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub node_id: String,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Label {
    pub name: String,
}

/// Present on an issue only when it is really a pull request.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PullRequestLinks {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContentKind {
    Issue,
    PullRequest,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Issue => write!(f, "Issue"),
            ContentKind::PullRequest => write!(f, "PullRequest"),
        }
    }
}

/// Issue-shaped item from the repository issues listing, which returns pull
/// requests too.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Issue {
    pub id: u64,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub pull_request: Option<PullRequestLinks>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn kind(&self) -> ContentKind {
        if self.is_pull_request() {
            ContentKind::PullRequest
        } else {
            ContentKind::Issue
        }
    }

    /// Label names compare ASCII case-insensitively, as the issues filter does.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels
            .iter()
            .any(|label| label.name.eq_ignore_ascii_case(name))
    }

    pub fn has_all_labels(&self, names: &[String]) -> bool {
        names.iter().all(|name| self.has_label(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    All,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
            IssueState::All => "all",
        }
    }
}

impl std::str::FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(IssueState::Open),
            "closed" => Ok(IssueState::Closed),
            "all" => Ok(IssueState::All),
            other => Err(format!("unknown issue state {:?} (expected open, closed or all)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueFilter {
    pub labels: Vec<String>,
    pub state: IssueState,
}

/// One page request, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` once the server reports no further page.
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepositoryScan {
    pub repository: String,
    pub items: Vec<Issue>,
}

impl RepositoryScan {
    pub fn pull_request_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_pull_request()).count()
    }

    pub fn issue_count(&self) -> usize {
        self.items.len() - self.pull_request_count()
    }
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub project_id: ProjectId,
    pub column: StatusColumn,
    pub repositories: Vec<RepositoryScan>,
    pub assigned: usize,
}

impl ScanReport {
    pub fn total_matched(&self) -> usize {
        self.repositories.iter().map(|r| r.items.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_without_pull_request_links_is_issue() {
        let issue: Issue = serde_json::from_value(serde_json::json!({
            "id": 1,
            "number": 7,
            "title": "Token refresh fails",
            "labels": [{"name": "sig/auth"}, {"name": "kind/bug"}]
        }))
        .unwrap();

        assert!(!issue.is_pull_request());
        assert_eq!(issue.kind(), ContentKind::Issue);
        assert!(issue.has_all_labels(&["sig/auth".to_string(), "kind/bug".to_string()]));
        assert!(!issue.has_all_labels(&["sig/auth".to_string(), "sig/node".to_string()]));
        assert!(issue.has_label("SIG/Auth"));
    }

    #[test]
    fn test_issue_with_pull_request_links_is_pull_request() {
        let issue: Issue = serde_json::from_value(serde_json::json!({
            "id": 2,
            "node_id": "PR_kw",
            "pull_request": {"url": "https://api.github.com/repos/k/k/pulls/2"}
        }))
        .unwrap();

        assert!(issue.is_pull_request());
        assert_eq!(issue.kind(), ContentKind::PullRequest);
        assert_eq!(issue.kind().to_string(), "PullRequest");
    }

    #[test]
    fn test_non_single_select_field_deserializes_empty() {
        let field: ProjectField = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(field, ProjectField::default());
    }

    #[test]
    fn test_issue_state_parse() {
        assert_eq!("all".parse::<IssueState>().unwrap(), IssueState::All);
        assert!("merged".parse::<IssueState>().is_err());
    }
}
