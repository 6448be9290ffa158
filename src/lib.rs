pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::assign::{DryRunAssigner, GithubProjectAssigner};
pub use adapters::github::GithubClient;
pub use config::{GithubSettings, TriageConfig};
pub use core::orchestrator::Orchestrator;
pub use utils::error::{Result, TriageError};
