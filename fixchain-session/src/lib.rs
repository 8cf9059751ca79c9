//! Conversation collaborators for the repair assistant: where turns are kept,
//! how usage is counted, how much history a run sees and what a session is
//! called.

mod error;
mod file_store;
mod store;
mod title;
pub mod tokens;
mod usage;
mod window;

pub use error::SessionError;
pub use file_store::FileHistoryStore;
pub use store::{HistoryStore, InMemoryHistoryStore, SessionInfo, Turn, TurnStatus};
pub use title::{heuristic_title, TitleGenerator, DEFAULT_TITLE, MAX_TITLE_CHARS};
pub use tokens::{estimate_message_tokens, estimate_tokens};
pub use usage::{InMemoryUsageRecorder, TokenUsage, UsageRecord, UsageRecorder, UsageSummary};
pub use window::{HistoryWindow, DEFAULT_MAX_MESSAGES, DEFAULT_MAX_TOKENS};
