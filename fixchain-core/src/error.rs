use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixchainError {
    #[error("LLM provider failed: {0}")]
    LlmProvider(String),
    /// Network failure, timeout, 408, 429 or 5xx. Worth another attempt.
    #[error("LLM provider unavailable: {0}")]
    LlmUnavailable(String),
    #[error("Tool call failed: {0}")]
    Tool(#[from] ToolError),
    #[error("Operation was cancelled")]
    Cancelled,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl FixchainError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::LlmUnavailable(_) => true,
            Self::Tool(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Failure reported by a tool adapter.
///
/// Only [`ToolError::Transient`] is eligible for retry; every other variant is
/// a semantic answer from the provider and is passed straight to the pipeline.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("transient failure in '{tool}': {reason}")]
    Transient { tool: String, reason: String },
    #[error("'{tool}' found nothing for '{query}'")]
    NotFound { tool: String, query: String },
    #[error("'{tool}' rejected the request ({status}): {reason}")]
    Rejected {
        tool: String,
        status: u16,
        reason: String,
    },
    #[error("'{tool}' returned a malformed payload: {reason}")]
    Malformed { tool: String, reason: String },
    #[error("'{tool}' is misconfigured: {reason}")]
    Misconfigured { tool: String, reason: String },
}

impl ToolError {
    pub fn transient(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transient {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Classifies an HTTP status the way every adapter in the workspace does:
    /// 408, 429 and 5xx are transient, 404 is not-found, other 4xx are rejections.
    pub fn from_status(
        tool: impl Into<String>,
        status: u16,
        query: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let tool = tool.into();
        match status {
            404 => Self::NotFound {
                tool,
                query: query.into(),
            },
            408 | 429 | 500..=599 => Self::Transient {
                tool,
                reason: format!("HTTP {status}: {}", reason.into()),
            },
            _ => Self::Rejected {
                tool,
                status,
                reason: reason.into(),
            },
        }
    }
}
