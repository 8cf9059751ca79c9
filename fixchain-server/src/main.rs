use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fixchain_core::{TextCompletion, Toolbox, WebSearch};
use fixchain_graph::{ExecutionConfig, RepairGraph, TracingObserver};
use fixchain_ifixit::IfixitCatalog;
use fixchain_llm::GeminiClient;
use fixchain_server::{cors_layer, router, AppState, HeaderAuthenticator, Settings};
use fixchain_session::{FileHistoryStore, HistoryStore, InMemoryHistoryStore, TitleGenerator};
use fixchain_tools::{DuckDuckGoSearch, TavilySearch};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let settings = Settings::parse();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    let completion: Arc<dyn TextCompletion> = Arc::new(
        GeminiClient::new(settings.gemini_api_key.clone(), settings.gemini_model.clone())
            .context("building the Gemini client")?,
    );
    let catalog = Arc::new(
        IfixitCatalog::builder()
            .base_url(settings.ifixit_base_url.clone())
            .build()
            .context("building the iFixit client")?,
    );

    let config = ExecutionConfig::default();
    let mut tools = Toolbox::builder()
        .completion(completion.clone())
        .devices(catalog.clone())
        .guides(catalog.clone())
        .details(catalog)
        .retry(config.retry);
    if let Some(key) = settings.tavily_api_key.clone() {
        let tavily = TavilySearch::new(key).context("building the Tavily client")?;
        tools = tools.web_search(Arc::new(tavily) as Arc<dyn WebSearch>);
    } else {
        tracing::warn!("TAVILY_API_KEY not set, community search uses DuckDuckGo only");
    }
    let duckduckgo = DuckDuckGoSearch::new().context("building the DuckDuckGo client")?;
    tools = tools.web_search(Arc::new(duckduckgo) as Arc<dyn WebSearch>);

    let graph = RepairGraph::builder(tools.build()?)
        .config(config)
        .observer(Arc::new(TracingObserver))
        .build()?;

    let history: Arc<dyn HistoryStore> = match &settings.history_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "keeping history on disk");
            Arc::new(FileHistoryStore::new(dir))
        }
        None => Arc::new(InMemoryHistoryStore::new()),
    };

    let auth = HeaderAuthenticator::from_pairs(&settings.api_tokens)?;
    if auth.is_empty() {
        tracing::warn!("FIXCHAIN_API_TOKENS is empty, every API request will be rejected");
    }

    let state = AppState::new(graph, Arc::new(auth))
        .with_history(history)
        .with_titles(TitleGenerator::new(completion))
        .with_window(settings.history_window());
    let app = router(state).layer(cors_layer(&settings.allowed_origin)?);

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("binding {}", settings.bind))?;
    tracing::info!(addr = %settings.bind, "fixchain listening");
    axum::serve(listener, app).await?;
    Ok(())
}
