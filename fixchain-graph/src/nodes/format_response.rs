use std::fmt::Write;

use fixchain_core::{RepairContent, SanitizedGuideContent, SearchHit};

use crate::node::{require, NodeContext, NodeOutput};
use crate::{AgentState, AgentUpdate, GraphError, Node, NodeId};

pub const OFFICIAL_LABEL: &str = "> ✅ Official iFixit guide";
pub const COMMUNITY_BANNER: &str = "## ⚠️ Community Sources (No Official iFixit Guide Found)\n\n\
> These results come from unverified community sources. Check them carefully before you start a repair.";

pub struct FormatResponse;

pub fn format_response(content: &RepairContent) -> String {
    match content {
        RepairContent::Official(guide) => format_official(guide),
        RepairContent::Community { query, hits } => format_community(query, hits),
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

// `write!` into a String cannot fail, so its results are ignored below.
pub fn format_official(guide: &SanitizedGuideContent) -> String {
    let mut out = String::new();
    let title = if guide.title.trim().is_empty() {
        "Repair Guide"
    } else {
        guide.title.as_str()
    };
    let _ = write!(out, "# {title}\n\n{OFFICIAL_LABEL}\n\n");
    let _ = writeln!(out, "**Device:** {}", or_na(&guide.subject));
    let _ = writeln!(out, "**Difficulty:** {}", or_na(&guide.difficulty));
    let _ = write!(out, "**Time Required:** {}\n\n", or_na(&guide.time_required));

    if !guide.introduction.trim().is_empty() {
        let _ = write!(out, "## Introduction\n{}\n\n", guide.introduction.trim());
    }

    if !guide.tools.is_empty() {
        out.push_str("## Tools Needed\n");
        for tool in &guide.tools {
            let _ = writeln!(out, "- {tool}");
        }
        out.push('\n');
    }

    if !guide.parts.is_empty() {
        out.push_str("## Parts\n");
        for part in &guide.parts {
            let _ = writeln!(out, "- {part}");
        }
        out.push('\n');
    }

    out.push_str("## Repair Steps\n\n");
    for step in &guide.steps {
        let _ = write!(out, "### Step {}\n\n", step.order);
        if !step.text.is_empty() {
            let _ = write!(out, "{}\n\n", step.text);
        }
        for url in &step.image_urls {
            let _ = write!(out, "![Step {}]({url})\n\n", step.order);
        }
    }

    out.trim_end().to_string()
}

pub fn format_community(query: &str, hits: &[SearchHit]) -> String {
    let mut out = String::new();
    let _ = write!(out, "{COMMUNITY_BANNER}\n\n**Query:** {}\n\n", query.trim());
    for (index, hit) in hits.iter().enumerate() {
        let _ = writeln!(out, "### {}. {}", index + 1, hit.title);
        if !hit.snippet.is_empty() {
            let _ = writeln!(out, "{}", hit.snippet);
        }
        let _ = write!(out, "[Source]({})\n\n", hit.url);
    }
    out.trim_end().to_string()
}

#[async_trait::async_trait]
impl Node for FormatResponse {
    fn id(&self) -> NodeId {
        NodeId::FormatResponse
    }

    fn announce(&self, _state: &AgentState) -> String {
        "Formatting response...".to_string()
    }

    async fn run(&self, state: &AgentState, _ctx: &NodeContext<'_>) -> Result<NodeOutput, GraphError> {
        let content = require(self.id(), "repair_content", state.repair_content())?;
        Ok(NodeOutput::advance(
            AgentUpdate::default().final_response(format_response(content)),
            "Response ready",
        ))
    }
}
