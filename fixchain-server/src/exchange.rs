//! One chat exchange: a user message, the pipeline run it starts, and what
//! ends up in the session history afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fixchain_core::StreamEvent;
use fixchain_graph::{AgentState, CancellationToken, GraphEvent};
use fixchain_session::{TokenUsage, Turn};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

use crate::{AppState, ServerError};

pub const HISTORY_UNAVAILABLE_MESSAGE: &str =
    "Your message could not be saved right now. Please try again in a moment.";

#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Cancellation handles of the runs currently streaming, one per session.
#[derive(Clone, Default)]
pub struct ActiveExchanges {
    inner: Arc<Mutex<HashMap<String, (Uuid, CancellationToken)>>>,
}

impl ActiveExchanges {
    /// A newer exchange on the same session supersedes the running one.
    fn register(&self, session_id: &str) -> (Uuid, CancellationToken) {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((_, previous)) = guard.insert(session_id.to_string(), (id, token.clone())) {
            previous.cancel();
        }
        (id, token)
    }

    fn finish(&self, session_id: &str, id: Uuid) {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.get(session_id).is_some_and(|(current, _)| *current == id) {
            guard.remove(session_id);
        }
    }

    /// Returns `false` when nothing was running for the session.
    pub fn cancel(&self, session_id: &str) -> bool {
        let guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.get(session_id) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        let guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.contains_key(session_id)
    }
}

#[derive(Clone, Debug)]
pub struct Exchange {
    pub user_id: String,
    pub session_id: String,
    pub message: String,
}

impl Exchange {
    /// Validates the request and resolves its session, creating one when the
    /// request names none. Sessions of other users look missing.
    pub async fn open(
        state: &AppState,
        user_id: String,
        request: ChatRequest,
    ) -> Result<Self, ServerError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ServerError::BadRequest("Message must not be empty".into()));
        }

        let requested = request
            .session_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        let session_id = match requested {
            Some(session_id) => match state.history.session_owner(&session_id).await? {
                Some(owner) if owner == user_id => session_id,
                _ => return Err(ServerError::NotFound("Session")),
            },
            None => state.history.create_session(&user_id).await?.session_id,
        };

        Ok(Self {
            user_id,
            session_id,
            message: message.to_string(),
        })
    }

    /// Starts the run on its own task. Dropping the receiver cancels it.
    pub fn spawn(self, state: AppState) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(state.channel_capacity.max(1));
        let span = tracing::info_span!(
            "exchange",
            session_id = %self.session_id,
            user_id = %self.user_id
        );
        tokio::spawn(self.run(state, tx).instrument(span));
        rx
    }

    async fn run(self, state: AppState, tx: mpsc::Sender<StreamEvent>) {
        let (exchange_id, cancel) = state.active.register(&self.session_id);
        self.drive(&state, &tx, &cancel).await;
        state.active.finish(&self.session_id, exchange_id);
    }

    async fn drive(
        &self,
        state: &AppState,
        tx: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) {
        let earlier = match state.history.load(&self.session_id).await {
            Ok(turns) => turns,
            Err(err) => {
                tracing::error!(error = %err, "could not load history, continuing without it");
                Vec::new()
            }
        };
        let first_message = earlier.is_empty();
        let context = state
            .window
            .trim(earlier.iter().filter_map(Turn::to_message).collect());
        tracing::info!(
            loaded = earlier.len(),
            used = context.len(),
            "prepared conversation context"
        );

        if let Err(err) = state
            .history
            .append(&self.session_id, Turn::user(&self.message))
            .await
        {
            tracing::error!(error = %err, "could not save the user message");
            let _ = tx
                .send(StreamEvent::Error(HISTORY_UNAVAILABLE_MESSAGE.to_string()))
                .await;
            let _ = tx.send(StreamEvent::Done).await;
            return;
        }

        if first_message {
            let title = state.titles.generate(&self.message).await;
            match state.history.set_title(&self.session_id, &title).await {
                Ok(()) => tracing::info!(title = %title, "titled session"),
                Err(err) => tracing::warn!(error = %err, "could not set session title"),
            }
        }

        let run = AgentState::new(
            self.user_id.as_str(),
            self.session_id.as_str(),
            context,
            self.message.as_str(),
        );
        let mut events = state.graph.stream_events(run, cancel.clone());
        loop {
            // `None` means the client went away.
            let step = tokio::select! {
                biased;
                _ = tx.closed(), if !cancel.is_cancelled() => None,
                next = events.next() => Some(next),
            };
            let event = match step {
                None => {
                    tracing::info!("client disconnected, cancelling run");
                    cancel.cancel();
                    continue;
                }
                Some(None) => break,
                Some(Some(event)) => event,
            };

            match event {
                // Only what reached the client is settled as its outcome.
                GraphEvent::Emit(event) => match tx.send(event.clone()).await {
                    Ok(()) => self.settle(state, &event).await,
                    Err(_) => {
                        if !cancel.is_cancelled() {
                            tracing::info!("client disconnected, cancelling run");
                            cancel.cancel();
                        }
                        if event.is_terminal() {
                            tracing::info!("outcome undelivered, exchange cancelled");
                            self.record_cancelled(state).await;
                        }
                    }
                },
                GraphEvent::Cancelled { node } => {
                    tracing::info!(node = %node, "exchange cancelled");
                    self.record_cancelled(state).await;
                }
                GraphEvent::NodeEnter { .. }
                | GraphEvent::NodeExit { .. }
                | GraphEvent::Finished(_) => {}
            }
        }
    }

    async fn record_cancelled(&self, state: &AppState) {
        if let Err(err) = state
            .history
            .append(&self.session_id, Turn::cancelled())
            .await
        {
            tracing::warn!(error = %err, "could not record the cancellation");
        }
    }

    /// Writes the outcome of a delivered terminal event to history and usage.
    async fn settle(&self, state: &AppState, event: &StreamEvent) {
        let turn = match event {
            StreamEvent::Response(answer) => {
                let usage = TokenUsage::estimate(&self.message, answer);
                if let Err(err) = state
                    .usage
                    .record(&self.user_id, &self.session_id, usage)
                    .await
                {
                    tracing::warn!(error = %err, "could not record token usage");
                }
                Turn::assistant(answer.as_str())
            }
            StreamEvent::Error(reason) => Turn::failed(reason.as_str()),
            StreamEvent::Status(_) | StreamEvent::Done => return,
        };
        if let Err(err) = state.history.append(&self.session_id, turn).await {
            tracing::error!(error = %err, "could not save the exchange outcome");
        }
    }
}
