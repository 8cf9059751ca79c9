use std::collections::BTreeSet;

use fixchain_core::{GuideRef, GuideSummary};

use crate::node::{require, NodeContext, NodeOutput};
use crate::{AgentState, AgentUpdate, GraphError, Node, NodeId};

pub struct SelectGuide;

/// Lowercase alphanumeric words of `text`.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Number of distinct query tokens that appear in the guide's title or summary.
pub fn score_guide(query_tokens: &BTreeSet<String>, guide: &GuideSummary) -> usize {
    let mut guide_tokens = tokenize(&guide.title);
    guide_tokens.extend(tokenize(&guide.summary));
    query_tokens.intersection(&guide_tokens).count()
}

/// Highest score wins; ties go to the earliest guide.
pub fn select_guide<'a>(query: &str, guides: &'a [GuideSummary]) -> Option<&'a GuideSummary> {
    let query_tokens = tokenize(query);
    let mut best: Option<(&GuideSummary, usize)> = None;
    for guide in guides {
        let score = score_guide(&query_tokens, guide);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((guide, score)),
        }
    }
    best.map(|(guide, _)| guide)
}

#[async_trait::async_trait]
impl Node for SelectGuide {
    fn id(&self) -> NodeId {
        NodeId::SelectGuide
    }

    fn announce(&self, _state: &AgentState) -> String {
        "Selecting most relevant guide...".to_string()
    }

    async fn run(&self, state: &AgentState, _ctx: &NodeContext<'_>) -> Result<NodeOutput, GraphError> {
        let query = require(self.id(), "normalized_query", state.normalized_query())?;
        let guides = require(self.id(), "available_guides", state.available_guides())?;
        let guide = select_guide(query, guides).ok_or(GraphError::MissingState {
            node: self.id(),
            field: "available_guides",
        })?;

        tracing::info!(guide_id = guide.id, title = %guide.title, "guide selected");
        let status = format!("Selected: {}", guide.title);
        Ok(NodeOutput::advance(
            AgentUpdate::default().selected_guide(GuideRef::from(guide)),
            status,
        ))
    }
}
