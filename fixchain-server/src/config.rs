use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use fixchain_ifixit::IFIXIT_BASE_URL;
use fixchain_llm::DEFAULT_GEMINI_MODEL;
use fixchain_session::HistoryWindow;
use secrecy::SecretString;

/// Server settings. Every flag can also come from the environment or `.env`.
#[derive(Debug, Parser)]
#[command(name = "fixchain")]
#[command(about = "Repair assistant grounded in verified iFixit guides")]
pub struct Settings {
    /// Gemini API key used for query normalization and session titles
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, value_parser = parse_secret)]
    pub gemini_api_key: SecretString,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    /// Enables Tavily as the primary community search; DuckDuckGo is always tried
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true, value_parser = parse_secret)]
    pub tavily_api_key: Option<SecretString>,

    #[arg(long, env = "IFIXIT_BASE_URL", default_value = IFIXIT_BASE_URL)]
    pub ifixit_base_url: String,

    #[arg(long, env = "FIXCHAIN_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Keep history as JSONL files here instead of in memory
    #[arg(long, env = "FIXCHAIN_HISTORY_DIR")]
    pub history_dir: Option<PathBuf>,

    /// Bearer tokens accepted by the API, as `token=user_id` pairs
    #[arg(long, env = "FIXCHAIN_API_TOKENS", default_value = "", hide_env_values = true)]
    pub api_tokens: String,

    /// Default tracing filter when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Earlier turns handed to the pipeline per request
    #[arg(long, env = "MAX_CONVERSATION_LENGTH", default_value_t = 20)]
    pub max_conversation_length: usize,

    #[arg(long, env = "ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    pub allowed_origin: String,
}

fn parse_secret(value: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::new(value.to_string()))
}

impl Settings {
    pub fn history_window(&self) -> HistoryWindow {
        HistoryWindow::default().with_max_messages(self.max_conversation_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_apply_when_only_the_key_is_given() {
        let settings =
            Settings::try_parse_from(["fixchain", "--gemini-api-key", "test-key"]).unwrap();
        assert_eq!(settings.gemini_api_key.expose_secret(), "test-key");
        assert_eq!(settings.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(settings.bind, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(settings.history_window().max_messages, 20);
        assert!(settings.tavily_api_key.is_none());
    }
}
