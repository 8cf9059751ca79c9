use thiserror::Error;

use fixchain_core::ToolError;

use crate::TOOL_NAME;

#[derive(Debug, Error)]
pub enum IfixitError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("ifixit api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl IfixitError {
    /// Maps into the pipeline taxonomy; `query` names what was being looked up.
    pub fn into_tool_error(self, query: &str) -> ToolError {
        match self {
            IfixitError::Config(reason) => ToolError::Misconfigured {
                tool: TOOL_NAME.to_string(),
                reason,
            },
            IfixitError::Transport(reason) => ToolError::transient(TOOL_NAME, reason),
            IfixitError::Api { status, message } => {
                ToolError::from_status(TOOL_NAME, status, query, message)
            }
            IfixitError::Malformed(reason) => ToolError::malformed(TOOL_NAME, reason),
        }
    }
}

impl From<IfixitError> for ToolError {
    fn from(value: IfixitError) -> Self {
        value.into_tool_error("")
    }
}
