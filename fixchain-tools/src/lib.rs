//! Fallback web-search adapters.
//!
//! Both implement [`fixchain_core::WebSearch`]; register them on the toolbox in
//! priority order (Tavily first when a key is configured, DuckDuckGo after).

mod duckduckgo;
mod error;
mod tavily;

pub use duckduckgo::{parse_html_results, DuckDuckGoSearch, DUCKDUCKGO_BASE_URL};
pub use error::SearchError;
pub use tavily::{TavilySearch, TAVILY_BASE_URL};
