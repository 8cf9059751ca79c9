use fixchain_core::Role;

use crate::node::{NodeContext, NodeFailure, NodeOutput};
use crate::{AgentState, AgentUpdate, GraphError, Node, NodeId};

const HISTORY_CONTEXT_TURNS: usize = 4;

/// Rewrites casual phrasing into a device name plus issue, e.g.
/// "my ps5 fan is loud" into "PlayStation 5 fan noise".
pub struct Normalize;

pub fn normalize_prompt(state: &AgentState) -> String {
    let mut prompt = String::from(
        "Convert this repair query into a clear, searchable device name and issue.\n\
         Output only the normalized query (device model + issue). Be concise.\n\
         Example: PlayStation 5 fan noise\n",
    );

    let earlier: Vec<_> = state
        .message_history()
        .iter()
        .filter(|message| message.role == Role::User)
        .rev()
        .take(HISTORY_CONTEXT_TURNS)
        .collect();
    if !earlier.is_empty() {
        prompt.push_str("\nEarlier questions in this conversation, newest first:\n");
        for message in earlier {
            prompt.push_str("- ");
            prompt.push_str(message.content.trim());
            prompt.push('\n');
        }
    }

    prompt.push_str("\nQuery: ");
    prompt.push_str(state.query().trim());
    prompt
}

/// First non-empty line of a completion with wrapping quotes and labels removed.
pub fn clean_completion(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let line = line
        .strip_prefix("Normalized query:")
        .or_else(|| line.strip_prefix("Query:"))
        .unwrap_or(line);
    let line = line.trim().trim_matches(|c| matches!(c, '"' | '\'' | '`')).trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[async_trait::async_trait]
impl Node for Normalize {
    fn id(&self) -> NodeId {
        NodeId::Normalize
    }

    fn announce(&self, _state: &AgentState) -> String {
        "Normalizing query...".to_string()
    }

    async fn run(&self, state: &AgentState, ctx: &NodeContext<'_>) -> Result<NodeOutput, GraphError> {
        let raw = state.query().trim().to_string();
        let failure = match ctx.tools.completion.complete(&normalize_prompt(state)).await {
            Ok(text) => match clean_completion(&text) {
                Some(normalized) => {
                    tracing::info!(query = %raw, normalized = %normalized, "query normalized");
                    let status = format!("Normalized to: {normalized}");
                    return Ok(NodeOutput::advance(
                        AgentUpdate::default().normalized_query(normalized),
                        status,
                    ));
                }
                None => NodeFailure::NormalizationFailure("empty completion".to_string()),
            },
            Err(err) => NodeFailure::NormalizationFailure(err.to_string()),
        };

        let status = format!("Normalized to: {raw}");
        Ok(NodeOutput::degraded(
            AgentUpdate::default().normalized_query(raw),
            status,
            failure,
        ))
    }
}
