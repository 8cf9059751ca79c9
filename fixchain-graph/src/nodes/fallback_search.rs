use fixchain_core::sanitize::sanitize_search_hits;
use fixchain_core::RepairContent;

use crate::node::{NodeContext, NodeFailure, NodeOutput};
use crate::{AgentState, AgentUpdate, GraphError, Node, NodeId};

/// Unverified web search, only entered after the catalog path failed.
pub struct FallbackSearch;

#[async_trait::async_trait]
impl Node for FallbackSearch {
    fn id(&self) -> NodeId {
        NodeId::FallbackSearch
    }

    fn announce(&self, _state: &AgentState) -> String {
        "Official guide not found, searching community sources...".to_string()
    }

    async fn run(&self, state: &AgentState, ctx: &NodeContext<'_>) -> Result<NodeOutput, GraphError> {
        let query = ctx.config.fallback_query(state.query());
        let limit = ctx.config.fallback_results;
        let mut attempted = Vec::with_capacity(ctx.tools.web.len());

        for search in &ctx.tools.web {
            match search.search(&query, limit).await {
                Ok(hits) => {
                    let hits = sanitize_search_hits(hits, limit);
                    if hits.is_empty() {
                        tracing::info!(adapter = search.name(), "fallback search returned nothing");
                        attempted.push(format!("{}: no results", search.name()));
                        continue;
                    }
                    tracing::info!(adapter = search.name(), count = hits.len(), "fallback search succeeded");
                    let status = format!("Found {} community sources", hits.len());
                    let content = RepairContent::Community {
                        query: state.query().trim().to_string(),
                        hits,
                    };
                    return Ok(NodeOutput::advance(
                        AgentUpdate::default().fallback_used().repair_content(content),
                        status,
                    ));
                }
                Err(err) => {
                    tracing::warn!(adapter = search.name(), error = %err, "fallback search failed");
                    attempted.push(format!("{}: {err}", search.name()));
                }
            }
        }

        Ok(NodeOutput::failed(
            AgentUpdate::default().fallback_used(),
            "No results from fallback search",
            NodeFailure::FallbackSearchFailure { attempted },
        ))
    }
}
