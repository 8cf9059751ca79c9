mod catalog;
mod error;
mod event;
mod llm;
mod retry;
pub mod sanitize;
mod tool;

pub use catalog::{
    Device, GuideRef, GuideStep, GuideSummary, RawGuide, RepairContent, SanitizedGuideContent,
    SearchHit,
};
pub use error::{FixchainError, ToolError};
pub use event::{EventKind, EventRecord, StreamEvent};
pub use llm::{Message, Role, TextCompletion};
pub use retry::{retry_transient, RetryPolicy, Retryable, Retrying};
pub use tool::{DeviceSearch, GuideCatalog, GuideDetail, Toolbox, ToolboxBuilder, WebSearch};
