use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use std::fmt::Display;

use crate::{
    Device, DeviceSearch, FixchainError, GuideCatalog, GuideDetail, GuideSummary, RawGuide,
    SearchHit, TextCompletion, ToolError, WebSearch,
};

/// Errors that say whether another attempt could succeed.
pub trait Retryable: Display {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ToolError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

impl Retryable for FixchainError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

/// Bounded retry for transient adapter failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Runs `op` until it succeeds, fails non-transiently, or attempts run out.
/// The last error is returned unchanged so callers can still classify it.
pub async fn retry_transient<T, E, F, Fut>(
    policy: RetryPolicy,
    tool: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(output) => return Ok(output),
            Err(error) if error.is_retryable() && attempt < max_attempts => {
                tracing::warn!(
                    tool = tool,
                    attempt = attempt,
                    error = %error,
                    "transient tool failure, retrying"
                );
                if !policy.backoff.is_zero() {
                    tokio::time::sleep(policy.backoff).await;
                }
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

pub struct Retrying<T: ?Sized> {
    inner: Arc<T>,
    policy: RetryPolicy,
}

impl<T: ?Sized> Retrying<T> {
    pub fn new(inner: Arc<T>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl<T: DeviceSearch + ?Sized> DeviceSearch for Retrying<T> {
    async fn search(&self, query: &str) -> Result<Vec<Device>, ToolError> {
        retry_transient(self.policy, "device_search", move || self.inner.search(query)).await
    }
}

#[async_trait::async_trait]
impl<T: GuideCatalog + ?Sized> GuideCatalog for Retrying<T> {
    async fn list(&self, device_id: &str) -> Result<Vec<GuideSummary>, ToolError> {
        retry_transient(self.policy, "guide_list", move || self.inner.list(device_id)).await
    }
}

#[async_trait::async_trait]
impl<T: GuideDetail + ?Sized> GuideDetail for Retrying<T> {
    async fn fetch(&self, guide_id: u64) -> Result<RawGuide, ToolError> {
        retry_transient(self.policy, "guide_detail", move || self.inner.fetch(guide_id)).await
    }
}

#[async_trait::async_trait]
impl<T: WebSearch + ?Sized> WebSearch for Retrying<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        retry_transient(self.policy, self.inner.name(), move || {
            self.inner.search(query, max_results)
        })
        .await
    }
}

#[async_trait::async_trait]
impl<T: TextCompletion + ?Sized> TextCompletion for Retrying<T> {
    async fn complete(&self, prompt: &str) -> Result<String, FixchainError> {
        retry_transient(self.policy, "completion", move || self.inner.complete(prompt)).await
    }
}
