use crate::adapters::github::GithubClient;
use crate::domain::model::{ColumnTarget, ContentKind};
use crate::domain::ports::Assigner;
use crate::utils::error::{Result, TriageError};
use async_trait::async_trait;
use serde::Deserialize;

const ADD_ITEM_MUTATION: &str = r#"mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: { projectId: $projectId, contentId: $contentId }) {
    item { id }
  }
}"#;

const SET_STATUS_MUTATION: &str = r#"mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!, $optionId: String!) {
  updateProjectV2ItemFieldValue(
    input: {
      projectId: $projectId
      itemId: $itemId
      fieldId: $fieldId
      value: { singleSelectOptionId: $optionId }
    }
  ) {
    projectV2Item { id }
  }
}"#;

/// Reports what would be filed without touching the project.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunAssigner;

#[async_trait]
impl Assigner for DryRunAssigner {
    async fn assign(&self, target: &ColumnTarget, content_id: &str, kind: ContentKind) -> Result<()> {
        tracing::debug!(
            "Dry run: would add {} {} to project {} with status {}",
            kind,
            content_id,
            target.project_id,
            target.option_id
        );
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemData {
    add_project_v2_item_by_id: Option<AddItemPayload>,
}

#[derive(Deserialize)]
struct AddItemPayload {
    item: Option<ItemRef>,
}

#[derive(Deserialize)]
struct ItemRef {
    id: String,
}

/// Adds the item to the project, then sets its `Status` to the target option.
/// Adding an item that is already on the board returns the existing item.
#[derive(Clone)]
pub struct GithubProjectAssigner {
    client: GithubClient,
}

impl GithubProjectAssigner {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Assigner for GithubProjectAssigner {
    async fn assign(&self, target: &ColumnTarget, content_id: &str, kind: ContentKind) -> Result<()> {
        let failed = |message: String| TriageError::AssignmentFailed {
            content_id: content_id.to_string(),
            message,
        };
        let mutation_error = |err: TriageError| match err {
            TriageError::GraphQl { messages } => failed(messages.join("; ")),
            other => other,
        };

        if content_id.is_empty() {
            return Err(failed(format!("{} has no node ID", kind)));
        }

        let added: AddItemData = self
            .client
            .graphql(
                ADD_ITEM_MUTATION,
                serde_json::json!({
                    "projectId": target.project_id,
                    "contentId": content_id,
                }),
            )
            .await
            .map_err(mutation_error)?;

        let item_id = added
            .add_project_v2_item_by_id
            .and_then(|payload| payload.item)
            .map(|item| item.id)
            .ok_or_else(|| failed("addProjectV2ItemById returned no item".to_string()))?;

        let _: serde_json::Value = self
            .client
            .graphql(
                SET_STATUS_MUTATION,
                serde_json::json!({
                    "projectId": target.project_id,
                    "itemId": item_id,
                    "fieldId": target.field_id,
                    "optionId": target.option_id,
                }),
            )
            .await
            .map_err(mutation_error)?;

        tracing::info!("Added {} {} to project as item {}", kind, content_id, item_id);
        Ok(())
    }
}
