//! Resolves human-facing board names into opaque node IDs.
//!
//! Both lookups are single round trips with no caching: the raw response is
//! projected into typed structs by the [`ProjectDirectory`] and then filtered
//! by the pure `select_*` functions below.

use crate::core::paginate::cancellable;
use crate::domain::model::{ProjectField, ProjectId, ProjectListing, StatusColumn};
use crate::domain::ports::ProjectDirectory;
use crate::utils::error::{ResourceKind, Result, TriageError};
use tokio_util::sync::CancellationToken;

/// The single-select field that holds the workflow columns.
pub const STATUS_FIELD_NAME: &str = "Status";

/// Projects fetched per organization. Projects past this are never searched.
pub const PROJECTS_PAGE_SIZE: u32 = 100;

/// Fields fetched per project.
pub const FIELDS_PAGE_SIZE: u32 = 20;

/// Picks the first project whose title matches exactly.
pub fn select_project(listing: &ProjectListing, title: &str) -> Result<ProjectId> {
    let mut matches = listing.projects.iter().filter(|p| p.title == title);
    let chosen = matches
        .next()
        .ok_or_else(|| TriageError::not_found(ResourceKind::Project, title))?;

    let duplicates = matches.count();
    if duplicates > 0 {
        tracing::warn!(
            "{} projects are titled {:?}; using the first returned ({})",
            duplicates + 1,
            title,
            chosen.id
        );
    }

    Ok(chosen.id.clone())
}

/// Finds `column` among the options of the field named [`STATUS_FIELD_NAME`].
pub fn select_status_option(fields: &[ProjectField], column: &str) -> Result<StatusColumn> {
    fields
        .iter()
        .filter(|field| field.name.as_deref() == Some(STATUS_FIELD_NAME))
        .find_map(|field| {
            let option = field.options.iter().find(|o| o.name == column)?;
            Some(StatusColumn {
                field_id: field.id.clone().unwrap_or_default(),
                option_id: option.id.clone(),
                name: option.name.clone(),
            })
        })
        .ok_or_else(|| TriageError::not_found(ResourceKind::Column, column))
}

pub struct QueryResolver<'a, D: ProjectDirectory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: ProjectDirectory + ?Sized> QueryResolver<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    pub async fn resolve_project_id(
        &self,
        org: &str,
        title: &str,
        cancel: &CancellationToken,
    ) -> Result<ProjectId> {
        let listing = cancellable(
            cancel,
            self.directory.organization_projects(org, PROJECTS_PAGE_SIZE),
        )
        .await?;

        if listing.has_next_page {
            tracing::warn!(
                "Organization {} has more than {} projects; only the first {} are searched",
                org,
                PROJECTS_PAGE_SIZE,
                PROJECTS_PAGE_SIZE
            );
        }

        let project_id = select_project(&listing, title)?;
        tracing::info!("Found project {:?} with ID {}", title, project_id);
        Ok(project_id)
    }

    pub async fn resolve_column(
        &self,
        project_id: &ProjectId,
        column: &str,
        cancel: &CancellationToken,
    ) -> Result<StatusColumn> {
        let fields = cancellable(
            cancel,
            self.directory.project_fields(project_id, FIELDS_PAGE_SIZE),
        )
        .await?;

        let status = select_status_option(&fields, column)?;
        tracing::info!("Found column {:?} with ID {}", column, status.option_id);
        Ok(status)
    }
}
