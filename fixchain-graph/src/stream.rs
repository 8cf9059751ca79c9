use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use fixchain_core::StreamEvent;

use crate::graph::{route, Transition, ENTRY};
use crate::node::NodeContext;
use crate::{AgentState, GraphError, NodeId, Outcome, RepairGraph};

pub const INTERNAL_ERROR_MESSAGE: &str =
    "Something went wrong while preparing your answer. Please try again.";

#[derive(Clone, Debug)]
pub enum GraphEvent {
    NodeEnter { node: NodeId },
    NodeExit { node: NodeId, outcome: Outcome },
    /// A client-facing event, in emission order.
    Emit(StreamEvent),
    /// Final state of a run that reached a terminal event.
    Finished(Box<AgentState>),
    /// The run stopped because its token was cancelled while `node` was current.
    Cancelled { node: NodeId },
}

/// Drives one run. Nothing happens until the stream is polled, and once it
/// ends it cannot be restarted.
pub(crate) fn run_stream(
    graph: RepairGraph,
    mut state: AgentState,
    cancel: CancellationToken,
) -> BoxStream<'static, GraphEvent> {
    Box::pin(async_stream::stream! {
        let session_id = state.session_id().to_string();
        let mut current = ENTRY;
        let mut steps = 0usize;

        loop {
            if cancel.is_cancelled() {
                graph.observer.on_cancelled(&session_id, current);
                yield GraphEvent::Cancelled { node: current };
                return;
            }

            steps += 1;
            if let Some(max) = graph.config.max_steps {
                if steps > max {
                    let err = GraphError::MaxStepsExceeded { max, reached: steps };
                    tracing::error!(session_id = %session_id, error = %err, "pipeline aborted");
                    yield GraphEvent::Emit(StreamEvent::Error(INTERNAL_ERROR_MESSAGE.to_string()));
                    yield GraphEvent::Emit(StreamEvent::Done);
                    return;
                }
            }

            let Some(node) = graph.nodes.get(&current).cloned() else {
                let err = GraphError::MissingNode { node: current };
                tracing::error!(session_id = %session_id, error = %err, "pipeline aborted");
                yield GraphEvent::Emit(StreamEvent::Error(INTERNAL_ERROR_MESSAGE.to_string()));
                yield GraphEvent::Emit(StreamEvent::Done);
                return;
            };

            graph.observer.on_node_enter(&session_id, current);
            yield GraphEvent::NodeEnter { node: current };
            let announcement = node.announce(&state);
            state.push_status(announcement.clone());
            yield GraphEvent::Emit(StreamEvent::Status(announcement));

            let result = {
                let ctx = NodeContext {
                    tools: &graph.tools,
                    config: &graph.config,
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = node.run(&state, &ctx) => Some(result),
                }
            };

            let output = match result {
                None => {
                    graph.observer.on_cancelled(&session_id, current);
                    yield GraphEvent::Cancelled { node: current };
                    return;
                }
                Some(Ok(output)) => output,
                Some(Err(err)) => {
                    tracing::error!(session_id = %session_id, node = %current, error = %err, "pipeline aborted");
                    yield GraphEvent::Emit(StreamEvent::Error(INTERNAL_ERROR_MESSAGE.to_string()));
                    yield GraphEvent::Emit(StreamEvent::Done);
                    return;
                }
            };

            if cancel.is_cancelled() {
                graph.observer.on_cancelled(&session_id, current);
                yield GraphEvent::Cancelled { node: current };
                return;
            }

            if let Err(err) = state.apply(output.update) {
                tracing::error!(session_id = %session_id, node = %current, error = %err, "pipeline aborted");
                yield GraphEvent::Emit(StreamEvent::Error(INTERNAL_ERROR_MESSAGE.to_string()));
                yield GraphEvent::Emit(StreamEvent::Done);
                return;
            }
            state.push_status(output.status.clone());
            yield GraphEvent::Emit(StreamEvent::Status(output.status));

            if let Outcome::Degraded(failure) | Outcome::Failed(failure) = &output.outcome {
                graph.observer.on_failure(&session_id, current, failure);
            }
            graph.observer.on_node_exit(&session_id, current);
            let transition = route(current, &output.outcome);
            yield GraphEvent::NodeExit { node: current, outcome: output.outcome };

            match transition {
                Transition::Goto(next) => current = next,
                Transition::Finish => {
                    let Some(response) = state.final_response().map(str::to_string) else {
                        let err = GraphError::NoFinalResponse;
                        tracing::error!(session_id = %session_id, error = %err, "pipeline aborted");
                        yield GraphEvent::Emit(StreamEvent::Error(INTERNAL_ERROR_MESSAGE.to_string()));
                        yield GraphEvent::Emit(StreamEvent::Done);
                        return;
                    };
                    tracing::info!(
                        session_id = %session_id,
                        fallback_used = state.fallback_used(),
                        "pipeline finished"
                    );
                    yield GraphEvent::Emit(StreamEvent::Response(response));
                    yield GraphEvent::Finished(Box::new(state.clone()));
                    yield GraphEvent::Emit(StreamEvent::Done);
                    return;
                }
                Transition::Abort(failure) => {
                    let message = failure.user_message().unwrap_or(INTERNAL_ERROR_MESSAGE);
                    yield GraphEvent::Emit(StreamEvent::Error(message.to_string()));
                    yield GraphEvent::Finished(Box::new(state.clone()));
                    yield GraphEvent::Emit(StreamEvent::Done);
                    return;
                }
            }
        }
    })
}
