pub mod labels;
pub mod orchestrator;
pub mod paginate;
pub mod repos;
pub mod resolver;

pub use crate::domain::model::{Issue, Page, PageRequest, ProjectId, Repository, ScanReport};
pub use crate::domain::ports::{Assigner, IssueTracker, ProjectDirectory};
pub use crate::utils::error::Result;
