use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{estimate_tokens, SessionError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self { input, output }
    }

    /// Estimated usage of one exchange: the user's message in, the answer out.
    pub fn estimate(message: &str, response: &str) -> Self {
        Self {
            input: estimate_tokens(message) as u64,
            output: estimate_tokens(response) as u64,
        }
    }

    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub session_id: String,
    pub usage: TokenUsage,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub user_id: String,
    pub total_tokens: u64,
    pub records: usize,
}

#[async_trait::async_trait]
pub trait UsageRecorder: Send + Sync + 'static {
    async fn record(
        &self,
        user_id: &str,
        session_id: &str,
        usage: TokenUsage,
    ) -> Result<(), SessionError>;

    async fn total(&self, user_id: &str) -> Result<UsageSummary, SessionError>;
}

#[derive(Default, Clone)]
pub struct InMemoryUsageRecorder {
    inner: Arc<RwLock<Vec<UsageRecord>>>,
}

impl InMemoryUsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Result<Vec<UsageRecord>, SessionError> {
        let guard = self.inner.read().map_err(|_| SessionError::Lock)?;
        Ok(guard.clone())
    }
}

#[async_trait::async_trait]
impl UsageRecorder for InMemoryUsageRecorder {
    async fn record(
        &self,
        user_id: &str,
        session_id: &str,
        usage: TokenUsage,
    ) -> Result<(), SessionError> {
        let mut guard = self.inner.write().map_err(|_| SessionError::Lock)?;
        guard.push(UsageRecord {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            usage,
            recorded_at: Utc::now(),
        });
        tracing::info!(
            user_id,
            session_id,
            input = usage.input,
            output = usage.output,
            "recorded token usage"
        );
        Ok(())
    }

    async fn total(&self, user_id: &str) -> Result<UsageSummary, SessionError> {
        let guard = self.inner.read().map_err(|_| SessionError::Lock)?;
        let (total_tokens, records) = guard
            .iter()
            .filter(|record| record.user_id == user_id)
            .fold((0, 0), |(tokens, count), record| {
                (tokens + record.usage.total(), count + 1)
            });
        Ok(UsageSummary {
            user_id: user_id.to_string(),
            total_tokens,
            records,
        })
    }
}
