//! Google Gemini `generateContent` client

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use fixchain_core::{FixchainError, Message, Role, TextCompletion};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
    http: Client,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Result<Self, FixchainError> {
        Self::with_timeout(api_key, model, Duration::from_secs(60))
    }

    pub fn with_timeout(
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FixchainError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FixchainError::InvalidConfig(format!("http client: {err}")))?;
        Ok(Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            model: model.into(),
            temperature: 0.1,
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_name(&self) -> &str {
        let model = self.model.trim();
        model.strip_prefix("models/").unwrap_or(model)
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model_name()
        )
    }

    /// One non-streaming generation over `messages`. System messages become the
    /// system instruction.
    pub async fn generate(&self, messages: &[Message]) -> Result<String, FixchainError> {
        let request = GenerateContentRequest {
            contents: map_contents(messages),
            system_instruction: system_instruction(messages),
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let response = self
            .http
            .post(self.generate_url())
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|err| FixchainError::LlmUnavailable(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));
            tracing::warn!(model = %self.model, %status, "gemini request failed");
            return Err(match status.as_u16() {
                408 | 429 | 500..=599 => FixchainError::LlmUnavailable(message),
                _ => FixchainError::LlmProvider(message),
            });
        }

        let response = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|err| FixchainError::LlmProvider(err.without_url().to_string()))?;

        let candidate = response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or_else(|| FixchainError::LlmProvider("No candidates in response".to_string()))?;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "UNKNOWN".to_string());
            if is_blocked_finish_reason(&reason) {
                return Err(FixchainError::LlmProvider(format!(
                    "Generation blocked: {}",
                    reason
                )));
            }
            return Err(FixchainError::LlmProvider(format!(
                "Empty completion (finish reason {})",
                reason
            )));
        }

        Ok(text)
    }
}

#[async_trait::async_trait]
impl TextCompletion for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, FixchainError> {
        let span = tracing::info_span!("gemini_complete", model = %self.model_name());
        self.generate(&[Message::user(prompt)])
            .instrument(span)
            .await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part {
            text: Some(text.to_string()),
        }],
    }
}

fn map_contents(messages: &[Message]) -> Vec<Content> {
    messages
        .iter()
        .filter_map(|message| match message.role {
            Role::System => None,
            Role::User => Some(text_content(Some("user"), &message.content)),
            Role::Assistant if message.content.is_empty() => None,
            Role::Assistant => Some(text_content(Some("model"), &message.content)),
        })
        .collect()
}

fn system_instruction(messages: &[Message]) -> Option<Content> {
    let parts: Vec<Part> = messages
        .iter()
        .filter(|message| matches!(message.role, Role::System))
        .map(|message| Part {
            text: Some(message.content.clone()),
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(Content { role: None, parts })
    }
}

fn is_blocked_finish_reason(reason: &str) -> bool {
    matches!(reason, "SAFETY" | "RECITATION" | "BLOCKLIST")
}
