use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use fixchain_core::{SearchHit, ToolError, WebSearch};

use crate::SearchError;

pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";
const NAME: &str = "tavily";

/// Tavily search API, tuned for LLM consumption.
#[derive(Clone)]
pub struct TavilySearch {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_answer: bool,
}

#[derive(Debug, Default, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TavilyErrorBody {
    #[serde(default)]
    detail: Option<TavilyErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TavilyErrorDetail {
    Text(String),
    Object { error: String },
}

impl TavilySearch {
    pub fn new(api_key: SecretString) -> Result<Self, SearchError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(SearchError::Config("api_key cannot be empty".to_string()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|err| SearchError::Config(format!("http client: {err}")))?;
        Ok(Self {
            http,
            base_url: TAVILY_BASE_URL.to_string(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let request = TavilySearchRequest {
            query,
            max_results,
            search_depth: "basic",
            include_answer: false,
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TavilyErrorBody>(&body) {
                Ok(TavilyErrorBody {
                    detail: Some(TavilyErrorDetail::Text(text)),
                })
                | Ok(TavilyErrorBody {
                    detail: Some(TavilyErrorDetail::Object { error: text }),
                }) => text,
                _ => body,
            };
            return Err(SearchError::Api {
                provider: NAME,
                status: status.as_u16(),
                message,
            });
        }

        let response: TavilySearchResponse = response.json().await?;
        Ok(response
            .results
            .into_iter()
            .map(|result| SearchHit {
                title: result.title,
                snippet: result.content,
                url: result.url,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl WebSearch for TavilySearch {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        let span = tracing::info_span!("tavily_search", query = %query, max_results);
        async move {
            let hits = self
                .request(query, max_results)
                .await
                .map_err(|err| err.into_tool_error(NAME, query))?;
            tracing::info!(count = hits.len(), "tavily returned hits");
            Ok(hits)
        }
        .instrument(span)
        .await
    }
}
