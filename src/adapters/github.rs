//! GitHub REST and GraphQL transport.
//!
//! [`GithubClient`] implements the read ports: organization projects and
//! project fields via GraphQL, repository and issue listings via REST with
//! `Link` header pagination.

use crate::config::GithubSettings;
use crate::domain::model::{
    Issue, IssueFilter, Page, PageRequest, ProjectField, ProjectId, ProjectListing, ProjectNode,
    Repository,
};
use crate::domain::ports::{IssueTracker, ProjectDirectory};
use crate::utils::error::{Result, TriageError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const API_VERSION: &str = "2022-11-28";

const ORGANIZATION_PROJECTS_QUERY: &str = r#"query($org: String!, $first: Int!) {
  organization(login: $org) {
    projectsV2(first: $first) {
      nodes { id title }
      pageInfo { hasNextPage }
    }
  }
}"#;

const PROJECT_FIELDS_QUERY: &str = r#"query($projectId: ID!, $first: Int!) {
  node(id: $projectId) {
    ... on ProjectV2 {
      fields(first: $first) {
        nodes {
          ... on ProjectV2SingleSelectField {
            id
            name
            options { id name }
          }
        }
      }
    }
  }
}"#;

#[derive(Deserialize)]
struct GqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Deserialize)]
struct GqlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
    #[serde(default)]
    page_info: Option<PageInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}

#[derive(Deserialize)]
struct OrganizationProjectsData {
    organization: Option<OrganizationProjects>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationProjects {
    projects_v2: Connection<ProjectNode>,
}

#[derive(Deserialize)]
struct ProjectFieldsData {
    node: Option<ProjectFieldsNode>,
}

#[derive(Deserialize)]
struct ProjectFieldsNode {
    #[serde(default)]
    fields: Option<Connection<ProjectField>>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Reads the page number of the `rel="next"` entry of a `Link` header.
pub fn next_page_from_link(header: &str) -> Option<u32> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        let target = parts.next()?;
        if !parts.any(|param| param == r#"rel="next""#) {
            return None;
        }
        let url = Url::parse(target.strip_prefix('<')?.strip_suffix('>')?).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    api_url: Url,
    graphql_url: Url,
}

impl GithubClient {
    pub fn new(settings: &GithubSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("project-triage/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = &settings.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                TriageError::InvalidConfigValueError {
                    field: "github.token".to_string(),
                    value: "<redacted>".to_string(),
                    reason: "Token contains characters not allowed in a header".to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            api_url: parse_url("github.api_url", &settings.api_url)?,
            graphql_url: parse_url("github.graphql_url", &settings.graphql_url)?,
        })
    }

    /// Runs a GraphQL operation and returns its `data`. Any entry in `errors`
    /// fails the call.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        tracing::debug!("POST {}", self.graphql_url);
        let response = self
            .client
            .post(self.graphql_url.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &bytes));
        }

        let gql: GqlResponse<T> = serde_json::from_slice(&bytes)?;
        if !gql.errors.is_empty() {
            return Err(TriageError::GraphQl {
                messages: gql.errors.into_iter().map(|e| e.message).collect(),
            });
        }
        gql.data.ok_or_else(|| TriageError::GraphQl {
            messages: vec!["response contained no data".to_string()],
        })
    }

    fn rest_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| TriageError::ConfigError {
                message: format!("{} cannot be used as a base URL", self.api_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Page<T>> {
        tracing::debug!("GET {} {:?}", url, query);
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page_from_link);
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &bytes));
        }

        let items: Vec<T> = serde_json::from_slice(&bytes)?;
        Ok(Page { items, next_page })
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| TriageError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })
}

fn api_error(status: u16, body: &[u8]) -> TriageError {
    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
    TriageError::Api { status, message }
}

fn paging(page: PageRequest) -> [(&'static str, String); 2] {
    [
        ("per_page", page.per_page.to_string()),
        ("page", page.page.to_string()),
    ]
}

#[async_trait]
impl ProjectDirectory for GithubClient {
    async fn organization_projects(&self, org: &str, first: u32) -> Result<ProjectListing> {
        let data: OrganizationProjectsData = self
            .graphql(
                ORGANIZATION_PROJECTS_QUERY,
                serde_json::json!({ "org": org, "first": first }),
            )
            .await?;

        let Some(organization) = data.organization else {
            return Ok(ProjectListing::default());
        };
        let connection = organization.projects_v2;
        Ok(ProjectListing {
            projects: connection.nodes.into_iter().flatten().collect(),
            has_next_page: connection.page_info.is_some_and(|p| p.has_next_page),
        })
    }

    async fn project_fields(&self, project_id: &ProjectId, first: u32) -> Result<Vec<ProjectField>> {
        let data: ProjectFieldsData = self
            .graphql(
                PROJECT_FIELDS_QUERY,
                serde_json::json!({ "projectId": project_id, "first": first }),
            )
            .await?;

        Ok(data
            .node
            .and_then(|node| node.fields)
            .map(|fields| fields.nodes.into_iter().flatten().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl IssueTracker for GithubClient {
    async fn list_org_repositories(&self, org: &str, page: PageRequest) -> Result<Page<Repository>> {
        let url = self.rest_url(&["orgs", org, "repos"])?;
        self.get_page(url, &paging(page)).await
    }

    async fn list_repository_issues(
        &self,
        owner: &str,
        repo: &str,
        filter: &IssueFilter,
        page: PageRequest,
    ) -> Result<Page<Issue>> {
        let url = self.rest_url(&["repos", owner, repo, "issues"])?;
        let mut query = vec![
            ("labels", filter.labels.join(",")),
            ("state", filter.state.as_str().to_string()),
        ];
        query.extend(paging(page));
        self.get_page(url, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::IssueState;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> GithubClient {
        GithubClient::new(&GithubSettings {
            api_url: server.base_url(),
            graphql_url: server.url("/graphql"),
            token: Some("ghp_test".to_string()),
            timeout_secs: Some(5),
        })
        .unwrap()
    }

    #[test]
    fn test_next_page_from_link() {
        let header = r#"<https://api.github.com/organizations/13629408/repos?per_page=100&page=2>; rel="next", <https://api.github.com/organizations/13629408/repos?per_page=100&page=4>; rel="last""#;
        assert_eq!(next_page_from_link(header), Some(2));

        let last_page = r#"<https://api.github.com/organizations/13629408/repos?per_page=100&page=3>; rel="prev", <https://api.github.com/organizations/13629408/repos?per_page=100&page=1>; rel="first""#;
        assert_eq!(next_page_from_link(last_page), None);

        assert_eq!(next_page_from_link(""), None);
        assert_eq!(next_page_from_link("garbage"), None);
    }

    #[tokio::test]
    async fn test_list_org_repositories_reads_link_header() {
        let server = MockServer::start();
        let next = format!(
            "<{}>; rel=\"next\"",
            server.url("/orgs/kubernetes/repos?per_page=2&page=2")
        );
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/orgs/kubernetes/repos")
                .query_param("per_page", "2")
                .query_param("page", "1")
                .header("authorization", "Bearer ghp_test")
                .header("accept", "application/vnd.github+json");
            then.status(200)
                .header("Content-Type", "application/json")
                .header("Link", next.as_str())
                .json_body(serde_json::json!([
                    {"id": 1, "node_id": "R_1", "name": "kubernetes", "full_name": "kubernetes/kubernetes"},
                    {"id": 2, "node_id": "R_2", "name": "website", "archived": true}
                ]));
        });

        let page = client_for(&server)
            .list_org_repositories("kubernetes", PageRequest { page: 1, per_page: 2 })
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(page.next_page, Some(2));
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].full_name.as_deref(), Some("kubernetes/kubernetes"));
        assert!(page.items[1].archived);
    }

    #[tokio::test]
    async fn test_list_repository_issues_sends_filter() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/kubernetes/kubernetes/issues")
                .query_param("labels", "sig/auth,kind/bug")
                .query_param("state", "all")
                .query_param("page", "3");
            then.status(200).json_body(serde_json::json!([
                {"id": 10, "node_id": "I_10", "number": 10, "labels": [{"name": "sig/auth"}]},
                {"id": 11, "node_id": "PR_11", "number": 11, "pull_request": {"url": "u"}}
            ]));
        });

        let filter = IssueFilter {
            labels: vec!["sig/auth".to_string(), "kind/bug".to_string()],
            state: IssueState::All,
        };
        let page = client_for(&server)
            .list_repository_issues(
                "kubernetes",
                "kubernetes",
                &filter,
                PageRequest { page: 3, per_page: 100 },
            )
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(page.next_page, None);
        assert!(!page.items[0].is_pull_request());
        assert!(page.items[1].is_pull_request());
    }

    #[tokio::test]
    async fn test_rest_error_status_surfaces_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/orgs/kubernetes/repos");
            then.status(401)
                .json_body(serde_json::json!({"message": "Bad credentials"}));
        });

        let err = client_for(&server)
            .list_org_repositories("kubernetes", PageRequest { page: 1, per_page: 100 })
            .await
            .unwrap_err();

        match err {
            TriageError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_organization_projects_query() {
        let server = MockServer::start();
        let gql_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .body_contains("projectsV2")
                .body_contains("\"org\":\"kubernetes\"");
            then.status(200).json_body(serde_json::json!({
                "data": {"organization": {"projectsV2": {
                    "nodes": [{"id": "PVT_0", "title": "Other"}, null, {"id": "PVT_1", "title": "SIG Auth"}],
                    "pageInfo": {"hasNextPage": true}
                }}}
            }));
        });

        let listing = client_for(&server)
            .organization_projects("kubernetes", 100)
            .await
            .unwrap();

        gql_mock.assert();
        assert_eq!(listing.projects.len(), 2);
        assert_eq!(listing.projects[1].id.as_str(), "PVT_1");
        assert!(listing.has_next_page);
    }

    #[tokio::test]
    async fn test_project_fields_skips_other_field_types() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql").body_contains("PVT_1");
            then.status(200).json_body(serde_json::json!({
                "data": {"node": {"fields": {"nodes": [
                    {},
                    {"id": "F_1", "name": "Status", "options": [{"id": "OPT_7", "name": "Needs Triage"}]}
                ]}}}
            }));
        });

        let fields = client_for(&server)
            .project_fields(&ProjectId::new("PVT_1"), 20)
            .await
            .unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ProjectField::default());
        assert_eq!(fields[1].options[0].id, "OPT_7");
    }

    #[tokio::test]
    async fn test_project_fields_unknown_node_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200)
                .json_body(serde_json::json!({"data": {"node": null}}));
        });

        let fields = client_for(&server)
            .project_fields(&ProjectId::new("PVT_missing"), 20)
            .await
            .unwrap();
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_graphql_errors_fail_the_call() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200).json_body(serde_json::json!({
                "data": {"organization": null},
                "errors": [{"message": "Could not resolve to an Organization with the login of 'nope'."}]
            }));
        });

        let err = client_for(&server)
            .organization_projects("nope", 100)
            .await
            .unwrap_err();

        assert!(matches!(err, TriageError::GraphQl { ref messages } if messages[0].contains("nope")));
    }
}
