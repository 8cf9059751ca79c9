use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fixchain_core::Toolbox;

use crate::{AgentState, AgentUpdate, ExecutionConfig, GraphError};

/// The seven pipeline steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Normalize,
    ResolveDevice,
    ListGuides,
    SelectGuide,
    FetchGuide,
    FallbackSearch,
    FormatResponse,
}

impl NodeId {
    pub const ALL: [NodeId; 7] = [
        NodeId::Normalize,
        NodeId::ResolveDevice,
        NodeId::ListGuides,
        NodeId::SelectGuide,
        NodeId::FetchGuide,
        NodeId::FallbackSearch,
        NodeId::FormatResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Normalize => "normalize",
            NodeId::ResolveDevice => "resolve_device",
            NodeId::ListGuides => "list_guides",
            NodeId::SelectGuide => "select_guide",
            NodeId::FetchGuide => "fetch_guide",
            NodeId::FallbackSearch => "fallback_search",
            NodeId::FormatResponse => "format_response",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed reasons a node did not produce its normal result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeFailure {
    #[error("query normalization failed: {0}")]
    NormalizationFailure(String),
    #[error("no device matched '{query}'")]
    DeviceNotFound { query: String },
    #[error("no guides available for '{device}'")]
    NoGuidesAvailable { device: String },
    #[error("guide {guide_id} could not be fetched: {reason}")]
    GuideFetchFailure { guide_id: u64, reason: String },
    #[error("every fallback search failed ({})", attempted.join(", "))]
    FallbackSearchFailure { attempted: Vec<String> },
}

pub const FALLBACK_FAILURE_MESSAGE: &str = "I couldn't find any repair information for your query. \
Please try rephrasing or providing more specific device details.";

impl NodeFailure {
    /// Only an exhausted fallback ends the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NodeFailure::FallbackSearchFailure { .. })
    }

    /// Text safe to show the end user when the failure ends the run.
    pub fn user_message(&self) -> Option<&'static str> {
        self.is_fatal().then_some(FALLBACK_FAILURE_MESSAGE)
    }
}

/// How a node's run ended, as seen by the router.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Advance,
    /// The node recovered on its own and the run continues on the success edge.
    Degraded(NodeFailure),
    Failed(NodeFailure),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeOutput {
    pub update: AgentUpdate,
    /// Status line describing the result.
    pub status: String,
    pub outcome: Outcome,
}

impl NodeOutput {
    pub fn advance(update: AgentUpdate, status: impl Into<String>) -> Self {
        Self {
            update,
            status: status.into(),
            outcome: Outcome::Advance,
        }
    }

    pub fn degraded(update: AgentUpdate, status: impl Into<String>, failure: NodeFailure) -> Self {
        Self {
            update,
            status: status.into(),
            outcome: Outcome::Degraded(failure),
        }
    }

    pub fn failed(update: AgentUpdate, status: impl Into<String>, failure: NodeFailure) -> Self {
        Self {
            update,
            status: status.into(),
            outcome: Outcome::Failed(failure),
        }
    }
}

/// Everything a node may read besides the state.
pub struct NodeContext<'a> {
    pub tools: &'a Toolbox,
    pub config: &'a ExecutionConfig,
}

#[async_trait::async_trait]
pub trait Node: Send + Sync {
    fn id(&self) -> NodeId;

    /// Status shown before the node's tool call starts.
    fn announce(&self, state: &AgentState) -> String;

    async fn run(&self, state: &AgentState, ctx: &NodeContext<'_>) -> Result<NodeOutput, GraphError>;
}

pub(crate) fn require<'a, T: ?Sized>(
    node: NodeId,
    field: &'static str,
    value: Option<&'a T>,
) -> Result<&'a T, GraphError> {
    value.ok_or(GraphError::MissingState { node, field })
}
