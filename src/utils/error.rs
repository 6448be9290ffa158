use std::fmt;
use thiserror::Error;

/// Which name failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Project,
    Column,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Project => write!(f, "project"),
            ResourceKind::Column => write!(f, "column"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("{kind} {name:?} not found")]
    NotFound { kind: ResourceKind, name: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL query failed: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Failed to add {content_id} to project: {message}")]
    AssignmentFailed { content_id: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value {value:?} for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    TransportFailure,
    Cancelled,
    Assignment,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TriageError {
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        TriageError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TriageError::NotFound { .. } => ErrorCategory::NotFound,
            TriageError::Http(_)
            | TriageError::Api { .. }
            | TriageError::GraphQl { .. }
            | TriageError::Decode(_) => ErrorCategory::TransportFailure,
            TriageError::Cancelled => ErrorCategory::Cancelled,
            TriageError::AssignmentFailed { .. } => ErrorCategory::Assignment,
            TriageError::IoError(_)
            | TriageError::ConfigError { .. }
            | TriageError::ConfigValidationError { .. }
            | TriageError::InvalidConfigValueError { .. }
            | TriageError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Cancelled => ErrorSeverity::Low,
            ErrorCategory::TransportFailure => ErrorSeverity::Medium,
            ErrorCategory::NotFound | ErrorCategory::Assignment => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TriageError::NotFound { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TriageError::NotFound { kind, name } => {
                format!("Could not find {} named {:?}", kind, name)
            }
            TriageError::Api { status: 401, .. } => {
                "GitHub rejected the token (401 Unauthorized)".to_string()
            }
            TriageError::Api { status: 403, message } => {
                format!("GitHub refused the request (403): {}", message)
            }
            TriageError::Cancelled => "Scan cancelled before completion".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TriageError::NotFound {
                kind: ResourceKind::Project,
                ..
            } => "Check the project title (matching is exact and case-sensitive) and that the token can read the organization's projects",
            TriageError::NotFound {
                kind: ResourceKind::Column,
                ..
            } => "Check that the project has a single-select field named \"Status\" with the requested option",
            TriageError::Http(_) => "Check network connectivity and the configured API URLs",
            TriageError::Api { status: 401, .. } | TriageError::Api { status: 403, .. } => {
                "Set GITHUB_TOKEN to a token with repo and project scopes"
            }
            TriageError::Api { .. } | TriageError::GraphQl { .. } | TriageError::Decode(_) => {
                "Retry later; the GitHub API returned an unexpected response"
            }
            TriageError::Cancelled => "Re-run the scan to completion",
            TriageError::AssignmentFailed { .. } => {
                "Check that the token has write access to the project"
            }
            _ => "Review the configuration file and command-line flags",
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
