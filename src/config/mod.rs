#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::paginate::MAX_PAGE_SIZE;
use crate::domain::model::IssueState;
use crate::utils::error::{Result, TriageError};
use crate::utils::validation::{
    validate_non_empty_list, validate_non_empty_string, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// What to scan and where matching items are filed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    pub org: String,
    pub project: String,
    pub column: String,
    pub labels: Vec<String>,
    pub page_size: u32,
    pub state: IssueState,
    /// Perform the project mutations instead of only reporting matches.
    pub assign: bool,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            org: "kubernetes".to_string(),
            project: "SIG Auth".to_string(),
            column: "Needs Triage".to_string(),
            labels: vec!["sig/auth".to_string()],
            page_size: MAX_PAGE_SIZE,
            state: IssueState::Open,
            assign: false,
        }
    }
}

impl Validate for TriageConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("board.org", &self.org)?;
        validate_non_empty_string("board.project", &self.project)?;
        validate_non_empty_string("board.column", &self.column)?;
        validate_non_empty_list("scan.labels", &self.labels)?;
        // The issues listing takes labels as one comma-separated parameter.
        for label in &self.labels {
            validate_non_empty_string("scan.labels", label)?;
            if label.contains(',') {
                return Err(TriageError::InvalidConfigValueError {
                    field: "scan.labels".to_string(),
                    value: label.clone(),
                    reason: "Label names containing ',' cannot be sent as a filter".to_string(),
                });
            }
        }
        validate_range("scan.page_size", self.page_size, 1, MAX_PAGE_SIZE)?;
        Ok(())
    }
}

/// Connection settings for the GitHub REST and GraphQL endpoints.
#[derive(Clone, PartialEq)]
pub struct GithubSettings {
    pub api_url: String,
    pub graphql_url: String,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            token: None,
            timeout_secs: None,
        }
    }
}

impl fmt::Debug for GithubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubSettings")
            .field("api_url", &self.api_url)
            .field("graphql_url", &self.graphql_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Validate for GithubSettings {
    fn validate(&self) -> Result<()> {
        validate_url("github.api_url", &self.api_url)?;
        validate_url("github.graphql_url", &self.graphql_url)?;
        if let Some(token) = &self.token {
            validate_non_empty_string("github.token", token)?;
        }
        if let Some(timeout) = self.timeout_secs {
            validate_range("github.timeout_secs", timeout, 1, 3600)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TriageConfig::default().validate().is_ok());
        assert!(GithubSettings::default().validate().is_ok());
    }

    #[test]
    fn test_page_size_above_api_maximum_is_rejected() {
        let config = TriageConfig {
            page_size: 250,
            ..TriageConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_label_with_comma_is_rejected() {
        let config = TriageConfig {
            labels: vec!["sig/auth".to_string(), "area/a,b".to_string()],
            ..TriageConfig::default()
        };
        match config.validate() {
            Err(TriageError::InvalidConfigValueError { field, value, .. }) => {
                assert_eq!(field, "scan.labels");
                assert_eq!(value, "area/a,b");
            }
            other => panic!("expected InvalidConfigValueError, got {:?}", other),
        }

        let blank = TriageConfig {
            labels: vec!["  ".to_string()],
            ..TriageConfig::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = GithubSettings {
            token: Some("ghp_secret".to_string()),
            ..GithubSettings::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
