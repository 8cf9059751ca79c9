use thiserror::Error;

use fixchain_core::ToolError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("{provider} api error {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SearchError {
    pub fn into_tool_error(self, tool: &str, query: &str) -> ToolError {
        match self {
            SearchError::Config(reason) => ToolError::Misconfigured {
                tool: tool.to_string(),
                reason,
            },
            SearchError::Transport(reason) => ToolError::transient(tool, reason),
            SearchError::Api {
                status, message, ..
            } => ToolError::from_status(tool, status, query, message),
            SearchError::Malformed(reason) => ToolError::malformed(tool, reason),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Malformed(err.without_url().to_string())
        } else {
            SearchError::Transport(err.without_url().to_string())
        }
    }
}
