use crate::config::{GithubSettings, TriageConfig};
use crate::domain::model::IssueState;
use crate::utils::error::{Result, TriageError};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk configuration. Every key is optional; missing keys keep the
/// built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub github: Option<GithubSection>,
    pub board: Option<BoardSection>,
    pub scan: Option<ScanSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubSection {
    pub api_url: Option<String>,
    pub graphql_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardSection {
    pub org: Option<String>,
    pub project: Option<String>,
    pub column: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSection {
    pub labels: Option<Vec<String>>,
    pub page_size: Option<u32>,
    pub state: Option<IssueState>,
    pub assign: Option<bool>,
}

impl TomlConfig {
    /// Loads and parses a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TriageError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TriageError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left
    /// as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TriageError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Layers the file's values over the defaults.
    pub fn into_settings(self) -> (TriageConfig, GithubSettings) {
        let mut triage = TriageConfig::default();
        let mut github = GithubSettings::default();

        if let Some(section) = self.github {
            if let Some(api_url) = section.api_url {
                github.api_url = api_url;
            }
            if let Some(graphql_url) = section.graphql_url {
                github.graphql_url = graphql_url;
            }
            github.token = section.token.or(github.token);
            github.timeout_secs = section.timeout_secs.or(github.timeout_secs);
        }

        if let Some(section) = self.board {
            if let Some(org) = section.org {
                triage.org = org;
            }
            if let Some(project) = section.project {
                triage.project = project;
            }
            if let Some(column) = section.column {
                triage.column = column;
            }
        }

        if let Some(section) = self.scan {
            if let Some(labels) = section.labels {
                triage.labels = labels;
            }
            if let Some(page_size) = section.page_size {
                triage.page_size = page_size;
            }
            if let Some(state) = section.state {
                triage.state = state;
            }
            if let Some(assign) = section.assign {
                triage.assign = assign;
            }
        }

        (triage, github)
    }

    pub fn validate_config(&self) -> Result<()> {
        let (triage, github) = self.clone().into_settings();
        github.validate()?;
        triage.validate()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[github]
api_url = "https://ghe.example.com/api/v3"
graphql_url = "https://ghe.example.com/api/graphql"
timeout_secs = 30

[board]
org = "kubernetes-sigs"
project = "SIG Node"
column = "Backlog"

[scan]
labels = ["sig/node", "kind/bug"]
page_size = 50
state = "all"
assign = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());

        let (triage, github) = config.into_settings();
        assert_eq!(triage.org, "kubernetes-sigs");
        assert_eq!(triage.project, "SIG Node");
        assert_eq!(triage.column, "Backlog");
        assert_eq!(triage.labels, vec!["sig/node", "kind/bug"]);
        assert_eq!(triage.page_size, 50);
        assert_eq!(triage.state, IssueState::All);
        assert!(triage.assign);
        assert_eq!(github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(github.timeout_secs, Some(30));
    }

    #[test]
    fn test_missing_sections_keep_defaults() {
        let config = TomlConfig::from_toml_str("[board]\nproject = \"Other\"\n").unwrap();
        let (triage, github) = config.into_settings();

        assert_eq!(triage.project, "Other");
        assert_eq!(triage.org, "kubernetes");
        assert_eq!(triage.labels, vec!["sig/auth"]);
        assert_eq!(github, GithubSettings::default());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PROJECT_TRIAGE_TEST_TOKEN", "ghp_from_env");

        let config = TomlConfig::from_toml_str(
            "[github]\ntoken = \"${PROJECT_TRIAGE_TEST_TOKEN}\"\n",
        )
        .unwrap();
        let (_, github) = config.into_settings();
        assert_eq!(github.token.as_deref(), Some("ghp_from_env"));

        std::env::remove_var("PROJECT_TRIAGE_TEST_TOKEN");
    }

    #[test]
    fn test_unset_env_var_is_left_verbatim() {
        let config =
            TomlConfig::from_toml_str("[board]\norg = \"${PROJECT_TRIAGE_UNSET_VAR}\"\n").unwrap();
        let (triage, _) = config.into_settings();
        assert_eq!(triage.org, "${PROJECT_TRIAGE_UNSET_VAR}");
    }

    #[test]
    fn test_config_validation() {
        let invalid_url = TomlConfig::from_toml_str("[github]\napi_url = \"invalid-url\"\n").unwrap();
        assert!(invalid_url.validate().is_err());

        let zero_page = TomlConfig::from_toml_str("[scan]\npage_size = 0\n").unwrap();
        assert!(zero_page.validate().is_err());

        let no_labels = TomlConfig::from_toml_str("[scan]\nlabels = []\n").unwrap();
        assert!(no_labels.validate().is_err());
    }

    #[test]
    fn test_unknown_state_fails_to_parse() {
        let result = TomlConfig::from_toml_str("[scan]\nstate = \"merged\"\n");
        assert!(matches!(result, Err(TriageError::ConfigValidationError { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[board]\norg = \"file-org\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        let (triage, _) = config.into_settings();
        assert_eq!(triage.org, "file-org");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = TomlConfig::from_file("/nonexistent/project-triage.toml");
        assert!(matches!(result, Err(TriageError::IoError(_))));
    }
}
