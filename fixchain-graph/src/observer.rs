use crate::{NodeFailure, NodeId};

pub trait Observer: Send + Sync {
    fn on_node_enter(&self, _session_id: &str, _node: NodeId) {}
    fn on_node_exit(&self, _session_id: &str, _node: NodeId) {}
    fn on_failure(&self, _session_id: &str, _node: NodeId, _failure: &NodeFailure) {}
    fn on_cancelled(&self, _session_id: &str, _node: NodeId) {}
}

/// Forwards graph progress to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_node_enter(&self, session_id: &str, node: NodeId) {
        tracing::debug!(session_id, node = %node, "node entered");
    }

    fn on_node_exit(&self, session_id: &str, node: NodeId) {
        tracing::debug!(session_id, node = %node, "node exited");
    }

    fn on_failure(&self, session_id: &str, node: NodeId, failure: &NodeFailure) {
        if failure.is_fatal() {
            tracing::error!(session_id, node = %node, error = %failure, "pipeline failed");
        } else {
            tracing::warn!(session_id, node = %node, error = %failure, "node failed, rerouting");
        }
    }

    fn on_cancelled(&self, session_id: &str, node: NodeId) {
        tracing::info!(session_id, node = %node, "run cancelled");
    }
}
