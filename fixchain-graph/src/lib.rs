//! The repair pipeline: per-run state, the seven nodes, the router that wires
//! them and the lazy event stream a transport consumes.

mod config;
mod error;
mod graph;
mod node;
pub mod nodes;
mod observer;
mod program;
mod state;
mod stream;

pub use config::{ExecutionConfig, DEFAULT_FALLBACK_QUERY_SUFFIX};
pub use error::GraphError;
pub use graph::{edges, route, GraphBuilder, RepairGraph, RunReport, Transition, ENTRY};
pub use node::{
    Node, NodeContext, NodeFailure, NodeId, NodeOutput, Outcome, FALLBACK_FAILURE_MESSAGE,
};
pub use observer::{Observer, TracingObserver};
pub use program::{EdgeKind, GraphProgram};
pub use state::{AgentState, AgentUpdate};
pub use stream::{GraphEvent, INTERNAL_ERROR_MESSAGE};

pub use tokio_util::sync::CancellationToken;
