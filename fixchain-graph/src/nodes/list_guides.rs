use fixchain_core::sanitize::sanitize_guide_listing;

use crate::node::{require, NodeContext, NodeFailure, NodeOutput};
use crate::{AgentState, AgentUpdate, GraphError, Node, NodeId};

pub struct ListGuides;

#[async_trait::async_trait]
impl Node for ListGuides {
    fn id(&self) -> NodeId {
        NodeId::ListGuides
    }

    fn announce(&self, _state: &AgentState) -> String {
        "Fetching available repair guides...".to_string()
    }

    async fn run(&self, state: &AgentState, ctx: &NodeContext<'_>) -> Result<NodeOutput, GraphError> {
        let device = require(self.id(), "selected_device", state.selected_device())?;

        let guides = match ctx.tools.guides.list(&device.id).await {
            Ok(guides) => sanitize_guide_listing(guides),
            Err(err) => {
                tracing::warn!(device_id = %device.id, error = %err, "guide listing failed");
                Vec::new()
            }
        };

        if guides.is_empty() {
            return Ok(NodeOutput::failed(
                AgentUpdate::default(),
                "No repair guides available",
                NodeFailure::NoGuidesAvailable {
                    device: device.name.clone(),
                },
            ));
        }

        tracing::info!(device_id = %device.id, count = guides.len(), "guides listed");
        let status = format!("Found {} repair guides", guides.len());
        Ok(NodeOutput::advance(
            AgentUpdate::default().available_guides(guides),
            status,
        ))
    }
}
