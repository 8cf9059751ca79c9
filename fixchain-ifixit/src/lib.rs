//! iFixit repair catalog integration for Fixchain.
//!
//! [`IfixitCatalog`] implements the three catalog adapters the pipeline needs:
//! device search, guide listing for a device category and guide detail fetch.
//! Only public API v2.0 endpoints are used; no key is required.
//!
//! Environment variables commonly used by the server:
//! - `IFIXIT_BASE_URL` (defaults to `https://www.ifixit.com/api/2.0`)

pub mod client;
mod catalog;
mod config;
mod error;
mod types;

pub use catalog::IfixitCatalog;
pub use config::{IfixitCatalogBuilder, IFIXIT_BASE_URL};
pub use error::IfixitError;
pub use types::{CategoryGuide, CategoryResponse, SearchResponse, SearchResult};

pub(crate) const TOOL_NAME: &str = "ifixit";
