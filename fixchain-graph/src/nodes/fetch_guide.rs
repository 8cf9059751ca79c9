use fixchain_core::sanitize::sanitize_guide;
use fixchain_core::RepairContent;

use crate::node::{require, NodeContext, NodeFailure, NodeOutput};
use crate::{AgentState, AgentUpdate, GraphError, Node, NodeId};

pub struct FetchGuide;

#[async_trait::async_trait]
impl Node for FetchGuide {
    fn id(&self) -> NodeId {
        NodeId::FetchGuide
    }

    fn announce(&self, _state: &AgentState) -> String {
        "Fetching repair instructions...".to_string()
    }

    async fn run(&self, state: &AgentState, ctx: &NodeContext<'_>) -> Result<NodeOutput, GraphError> {
        let guide = require(self.id(), "selected_guide", state.selected_guide())?;
        let failed = |reason: String| {
            NodeOutput::failed(
                AgentUpdate::default(),
                "Failed to fetch repair guide",
                NodeFailure::GuideFetchFailure {
                    guide_id: guide.id,
                    reason,
                },
            )
        };

        let raw = match ctx.tools.details.fetch(guide.id).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(guide_id = guide.id, error = %err, "guide fetch failed");
                return Ok(failed(err.to_string()));
            }
        };

        let mut content = sanitize_guide(&raw);
        if content.steps.is_empty() {
            tracing::warn!(guide_id = guide.id, "guide has no usable steps");
            return Ok(failed("guide has no steps".to_string()));
        }
        if content.title.is_empty() {
            content.title = guide.title.clone();
        }

        tracing::info!(guide_id = guide.id, steps = content.steps.len(), "guide fetched");
        let status = format!("Retrieved {} repair steps", content.steps.len());
        Ok(NodeOutput::advance(
            AgentUpdate::default().repair_content(RepairContent::Official(content)),
            status,
        ))
    }
}
