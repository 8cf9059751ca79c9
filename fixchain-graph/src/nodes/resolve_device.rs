use fixchain_core::sanitize::sanitize_devices;
use fixchain_core::Device;

use crate::node::{require, NodeContext, NodeFailure, NodeOutput};
use crate::{AgentState, AgentUpdate, GraphError, Node, NodeId};

pub const DEVICE_LIMIT: usize = 5;

pub struct ResolveDevice;

/// Exact case-insensitive name match first, otherwise the adapter's first result.
pub fn pick_device<'a>(query: &str, devices: &'a [Device]) -> Option<&'a Device> {
    let query = query.trim().to_lowercase();
    devices
        .iter()
        .find(|device| device.name.trim().to_lowercase() == query)
        .or_else(|| devices.first())
}

#[async_trait::async_trait]
impl Node for ResolveDevice {
    fn id(&self) -> NodeId {
        NodeId::ResolveDevice
    }

    fn announce(&self, _state: &AgentState) -> String {
        "Searching iFixit for device...".to_string()
    }

    async fn run(&self, state: &AgentState, ctx: &NodeContext<'_>) -> Result<NodeOutput, GraphError> {
        let query = require(self.id(), "normalized_query", state.normalized_query())?;
        let not_found = || {
            NodeOutput::failed(
                AgentUpdate::default(),
                "No device found on iFixit",
                NodeFailure::DeviceNotFound {
                    query: query.to_string(),
                },
            )
        };

        let devices = match ctx.tools.devices.search(query).await {
            Ok(devices) => sanitize_devices(devices, DEVICE_LIMIT),
            Err(err) => {
                tracing::warn!(query, error = %err, "device search failed");
                return Ok(not_found());
            }
        };

        match pick_device(query, &devices) {
            Some(device) => {
                tracing::info!(device_id = %device.id, "device found");
                let status = format!("Found device: {}", device.name);
                Ok(NodeOutput::advance(
                    AgentUpdate::default().selected_device(device.clone()),
                    status,
                ))
            }
            None => {
                tracing::warn!(query, "no device found");
                Ok(not_found())
            }
        }
    }
}
