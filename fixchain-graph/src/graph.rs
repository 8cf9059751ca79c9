use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use fixchain_core::{StreamEvent, Toolbox};

use crate::nodes::default_nodes;
use crate::program::GraphProgram;
use crate::stream::{run_stream, GraphEvent};
use crate::{
    AgentState, ExecutionConfig, GraphError, Node, NodeFailure, NodeId, Observer, Outcome,
    TracingObserver,
};

/// Where the router sends the run after a node finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Goto(NodeId),
    Finish,
    Abort(NodeFailure),
}

/// The single routing table. Every edge of the pipeline is one arm here.
pub fn route(from: NodeId, outcome: &Outcome) -> Transition {
    use NodeId::*;
    match (from, outcome) {
        (Normalize, Outcome::Advance) => Transition::Goto(ResolveDevice),
        (ResolveDevice, Outcome::Advance) => Transition::Goto(ListGuides),
        (ListGuides, Outcome::Advance) => Transition::Goto(SelectGuide),
        (SelectGuide, Outcome::Advance) => Transition::Goto(FetchGuide),
        (FetchGuide, Outcome::Advance) => Transition::Goto(FormatResponse),
        (FallbackSearch, Outcome::Advance) => Transition::Goto(FormatResponse),
        (FormatResponse, Outcome::Advance) => Transition::Finish,

        (ResolveDevice | ListGuides | FetchGuide, Outcome::Failed(_)) => {
            Transition::Goto(FallbackSearch)
        }
        (_, Outcome::Failed(failure)) => Transition::Abort(failure.clone()),

        (node, Outcome::Degraded(_)) => route(node, &Outcome::Advance),
    }
}

pub const ENTRY: NodeId = NodeId::Normalize;

/// Every `(from, to, on_failure)` edge the router can take.
pub fn edges() -> Vec<(NodeId, NodeId, bool)> {
    let failed = Outcome::Failed(NodeFailure::NormalizationFailure(String::new()));
    let mut edges = Vec::new();
    for from in NodeId::ALL {
        if let Transition::Goto(to) = route(from, &Outcome::Advance) {
            edges.push((from, to, false));
        }
        if let Transition::Goto(to) = route(from, &failed) {
            edges.push((from, to, true));
        }
    }
    edges
}

pub struct GraphBuilder {
    tools: Toolbox,
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    config: ExecutionConfig,
    observer: Arc<dyn Observer>,
}

impl GraphBuilder {
    pub fn new(tools: Toolbox) -> Self {
        let nodes = default_nodes()
            .into_iter()
            .map(|node| (node.id(), node))
            .collect();
        Self {
            tools,
            nodes,
            config: ExecutionConfig::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the node registered under the same id.
    pub fn node(mut self, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(node.id(), node);
        self
    }

    pub fn without_node(mut self, id: NodeId) -> Self {
        self.nodes.remove(&id);
        self
    }

    pub fn config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn build(self) -> Result<RepairGraph, GraphError> {
        for id in NodeId::ALL {
            if !self.nodes.contains_key(&id) {
                return Err(GraphError::MissingNode { node: id });
            }
        }
        GraphProgram::from_router().topological_order()?;

        Ok(RepairGraph {
            nodes: Arc::new(self.nodes),
            tools: self.tools,
            config: Arc::new(self.config),
            observer: self.observer,
        })
    }
}

/// The wired pipeline. Cheap to clone; every run gets its own [`AgentState`].
#[derive(Clone)]
pub struct RepairGraph {
    pub(crate) nodes: Arc<HashMap<NodeId, Arc<dyn Node>>>,
    pub(crate) tools: Toolbox,
    pub(crate) config: Arc<ExecutionConfig>,
    pub(crate) observer: Arc<dyn Observer>,
}

impl RepairGraph {
    pub fn builder(tools: Toolbox) -> GraphBuilder {
        GraphBuilder::new(tools)
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Lazy event sequence for one run, graph bookkeeping included.
    pub fn stream_events(
        &self,
        state: AgentState,
        cancel: CancellationToken,
    ) -> BoxStream<'static, GraphEvent> {
        run_stream(self.clone(), state, cancel)
    }

    /// Only the client-facing events of one run.
    pub fn stream(
        &self,
        state: AgentState,
        cancel: CancellationToken,
    ) -> BoxStream<'static, StreamEvent> {
        self.stream_events(state, cancel)
            .filter_map(|event| async move {
                match event {
                    GraphEvent::Emit(event) => Some(event),
                    _ => None,
                }
            })
            .boxed()
    }

    pub async fn invoke(&self, state: AgentState) -> RunReport {
        self.invoke_with_cancel(state, CancellationToken::new()).await
    }

    pub async fn invoke_with_cancel(
        &self,
        state: AgentState,
        cancel: CancellationToken,
    ) -> RunReport {
        let mut report = RunReport::default();
        let mut events = self.stream_events(state, cancel);
        while let Some(event) = events.next().await {
            match event {
                GraphEvent::Emit(event) => report.events.push(event),
                GraphEvent::Finished(state) => report.state = Some(*state),
                GraphEvent::Cancelled { .. } => report.cancelled = true,
                GraphEvent::NodeEnter { .. } | GraphEvent::NodeExit { .. } => {}
            }
        }
        report
    }
}

/// Collected result of a run driven to completion.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub events: Vec<StreamEvent>,
    pub state: Option<AgentState>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn response(&self) -> Option<&str> {
        self.events.iter().find_map(|event| match event {
            StreamEvent::Response(content) => Some(content.as_str()),
            _ => None,
        })
    }

    pub fn error(&self) -> Option<&str> {
        self.events.iter().find_map(|event| match event {
            StreamEvent::Error(content) => Some(content.as_str()),
            _ => None,
        })
    }

    pub fn statuses(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                StreamEvent::Status(content) => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }
}
