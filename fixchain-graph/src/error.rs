use thiserror::Error;

use crate::NodeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("field '{field}' was already set earlier in this run")]
    FieldAlreadySet { field: &'static str },
    #[error("node '{node}' needs '{field}', which no earlier node set")]
    MissingState { node: NodeId, field: &'static str },
    #[error("missing node: {node}")]
    MissingNode { node: NodeId },
    #[error("Max steps exceeded: reached {reached}, limit {max}")]
    MaxStepsExceeded { max: usize, reached: usize },
    #[error("Cycle detected: node '{node}' is reachable from itself")]
    CycleDetected { node: NodeId },
    #[error("run finished without a final response")]
    NoFinalResponse,
}
