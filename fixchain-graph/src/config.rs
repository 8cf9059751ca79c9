use fixchain_core::RetryPolicy;

pub const DEFAULT_FALLBACK_QUERY_SUFFIX: &str = "repair guide";

#[derive(Clone, Debug)]
pub struct ExecutionConfig {
    /// Upper bound on node executions per run.
    pub max_steps: Option<usize>,
    /// Hits kept from each fallback search adapter.
    pub fallback_results: usize,
    pub fallback_query_suffix: String,
    pub retry: RetryPolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(16),
            fallback_results: 3,
            fallback_query_suffix: DEFAULT_FALLBACK_QUERY_SUFFIX.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ExecutionConfig {
    pub fn fallback_query(&self, query: &str) -> String {
        let query = query.trim();
        let suffix = self.fallback_query_suffix.trim();
        if suffix.is_empty() {
            query.to_string()
        } else {
            format!("{query} {suffix}")
        }
    }
}
