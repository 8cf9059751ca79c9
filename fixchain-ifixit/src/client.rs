use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::IfixitError;

#[derive(Clone, Debug)]
pub struct IfixitHttpClient {
    http: Client,
    base_url: Url,
}

impl IfixitHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IfixitError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| IfixitError::Config(format!("invalid base_url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(IfixitError::Config(format!(
                "base_url cannot carry a path: {base_url}"
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fixchain/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| IfixitError::Config(format!("http client: {err}")))?;

        Ok(Self { http, base_url })
    }

    /// Base URL with `segments` appended, each percent-encoded on its own.
    pub fn url_for(&self, segments: &[&str]) -> Result<Url, IfixitError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IfixitError::Config(format!("invalid base_url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get_typed<Resp>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Resp, IfixitError>
    where
        Resp: DeserializeOwned,
    {
        let url = self.url_for(segments)?;
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| IfixitError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Resp>()
                .await
                .map_err(|err| IfixitError::Malformed(err.to_string()));
        }

        let body: Value = response
            .json::<Value>()
            .await
            .unwrap_or_else(|_| Value::String(String::new()));
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| body.get("error").and_then(Value::as_str))
            .unwrap_or("unknown ifixit error")
            .to_string();

        Err(IfixitError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn get_json(&self, segments: &[&str]) -> Result<Value, IfixitError> {
        self.get_typed(segments, &[]).await
    }
}
