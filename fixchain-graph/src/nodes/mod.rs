mod fallback_search;
mod fetch_guide;
mod format_response;
mod list_guides;
mod normalize;
mod resolve_device;
mod select_guide;

use std::sync::Arc;

pub use fallback_search::FallbackSearch;
pub use fetch_guide::FetchGuide;
pub use format_response::{
    format_community, format_official, format_response, FormatResponse, COMMUNITY_BANNER,
    OFFICIAL_LABEL,
};
pub use list_guides::ListGuides;
pub use normalize::{clean_completion, normalize_prompt, Normalize};
pub use resolve_device::{pick_device, ResolveDevice, DEVICE_LIMIT};
pub use select_guide::{score_guide, select_guide, tokenize, SelectGuide};

use crate::Node;

/// One instance of every pipeline node.
pub fn default_nodes() -> Vec<Arc<dyn Node>> {
    vec![
        Arc::new(Normalize),
        Arc::new(ResolveDevice),
        Arc::new(ListGuides),
        Arc::new(SelectGuide),
        Arc::new(FetchGuide),
        Arc::new(FallbackSearch),
        Arc::new(FormatResponse),
    ]
}
