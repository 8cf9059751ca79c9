use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::graph::edges;
use crate::{GraphError, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    Success,
    Failure,
}

/// Inspectable view of the router as a directed graph.
pub struct GraphProgram {
    graph: Graph<NodeId, EdgeKind>,
    index: HashMap<NodeId, NodeIndex>,
}

impl GraphProgram {
    pub fn from_router() -> Self {
        let mut graph = Graph::new();
        let index: HashMap<NodeId, NodeIndex> = NodeId::ALL
            .into_iter()
            .map(|id| (id, graph.add_node(id)))
            .collect();
        for (from, to, on_failure) in edges() {
            let kind = if on_failure {
                EdgeKind::Failure
            } else {
                EdgeKind::Success
            };
            graph.add_edge(index[&from], index[&to], kind);
        }
        Self { graph, index }
    }

    pub fn node_names(&self) -> Vec<&'static str> {
        self.graph.node_weights().map(NodeId::as_str).collect()
    }

    pub fn edge_names(&self) -> Vec<(NodeId, NodeId, EdgeKind)> {
        self.graph
            .edge_references()
            .filter_map(|edge| {
                let from = self.graph.node_weight(edge.source())?;
                let to = self.graph.node_weight(edge.target())?;
                Some((*from, *to, *edge.weight()))
            })
            .collect()
    }

    pub fn successors(&self, node: NodeId) -> Vec<(NodeId, EdgeKind)> {
        let Some(&index) = self.index.get(&node) else {
            return Vec::new();
        };
        let mut successors: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (self.graph[edge.target()], *edge.weight()))
            .collect();
        successors.sort();
        successors
    }

    pub fn predecessors(&self, node: NodeId) -> Vec<(NodeId, EdgeKind)> {
        let Some(&index) = self.index.get(&node) else {
            return Vec::new();
        };
        let mut predecessors: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| (self.graph[edge.source()], *edge.weight()))
            .collect();
        predecessors.sort();
        predecessors
    }

    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|index| self.graph[index]).collect())
            .map_err(|cycle| GraphError::CycleDetected {
                node: self.graph[cycle.node_id()],
            })
    }
}
