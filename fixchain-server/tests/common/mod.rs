#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::Notify;

use fixchain_core::{
    Device, DeviceSearch, FixchainError, GuideCatalog, GuideDetail, GuideSummary, RawGuide,
    SearchHit, StreamEvent, TextCompletion, ToolError, Toolbox, WebSearch,
};
use fixchain_graph::RepairGraph;
use fixchain_server::{router, AppState, HeaderAuthenticator};

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";

pub struct Completion(pub Result<String, String>);

#[async_trait::async_trait]
impl TextCompletion for Completion {
    async fn complete(&self, _prompt: &str) -> Result<String, FixchainError> {
        self.0.clone().map_err(FixchainError::LlmProvider)
    }
}

pub struct Devices(pub Vec<Device>);

#[async_trait::async_trait]
impl DeviceSearch for Devices {
    async fn search(&self, _query: &str) -> Result<Vec<Device>, ToolError> {
        Ok(self.0.clone())
    }
}

pub struct Guides(pub Vec<GuideSummary>);

#[async_trait::async_trait]
impl GuideCatalog for Guides {
    async fn list(&self, _device_id: &str) -> Result<Vec<GuideSummary>, ToolError> {
        Ok(self.0.clone())
    }
}

pub struct Details(pub RawGuide);

#[async_trait::async_trait]
impl GuideDetail for Details {
    async fn fetch(&self, _guide_id: u64) -> Result<RawGuide, ToolError> {
        Ok(self.0.clone())
    }
}

/// Signals `entered` and then never returns.
pub struct HangingDetails {
    pub entered: Arc<Notify>,
}

#[async_trait::async_trait]
impl GuideDetail for HangingDetails {
    async fn fetch(&self, _guide_id: u64) -> Result<RawGuide, ToolError> {
        self.entered.notify_one();
        std::future::pending().await
    }
}

pub struct Web(pub Result<Vec<SearchHit>, ToolError>);

#[async_trait::async_trait]
impl WebSearch for Web {
    fn name(&self) -> &str {
        "web"
    }

    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        self.0.clone()
    }
}

pub fn ps5() -> Device {
    Device {
        id: "PlayStation 5".to_string(),
        name: "PlayStation 5".to_string(),
    }
}

pub fn ps5_guides() -> Vec<GuideSummary> {
    vec![
        GuideSummary {
            id: 101,
            title: "PlayStation 5 Disc Drive Replacement".to_string(),
            summary: "Replace the disc drive".to_string(),
        },
        GuideSummary {
            id: 102,
            title: "PlayStation 5 Fan Replacement".to_string(),
            summary: "Replace a loud or noisy fan".to_string(),
        },
    ]
}

pub fn ps5_fan_guide() -> RawGuide {
    RawGuide::new(json!({
        "guideid": 102,
        "title": "PlayStation 5 Fan Replacement",
        "subject": "PlayStation 5",
        "steps": [
            {
                "orderby": 1,
                "title": "Remove the cover",
                "lines": [{"text_raw": "Pull the top corner up."}]
            },
            {
                "orderby": 2,
                "title": "Remove the fan",
                "lines": [{"text_raw": "Lift the fan out."}]
            }
        ]
    }))
}

fn toolbox(details: Arc<dyn GuideDetail>, devices: Vec<Device>, web: Web) -> Toolbox {
    Toolbox::builder()
        .completion(Arc::new(Completion(Ok("PlayStation 5 fan noise".into()))))
        .devices(Arc::new(Devices(devices)))
        .guides(Arc::new(Guides(ps5_guides())))
        .details(details)
        .web_search(Arc::new(web))
        .build()
        .unwrap()
}

pub fn official_toolbox() -> Toolbox {
    toolbox(
        Arc::new(Details(ps5_fan_guide())),
        vec![ps5()],
        Web(Ok(Vec::new())),
    )
}

/// No device is ever found and community search fails too.
pub fn dead_end_toolbox() -> Toolbox {
    toolbox(
        Arc::new(Details(ps5_fan_guide())),
        Vec::new(),
        Web(Err(ToolError::transient("web", "connection reset"))),
    )
}

pub fn hanging_toolbox(entered: Arc<Notify>) -> Toolbox {
    toolbox(
        Arc::new(HangingDetails { entered }),
        vec![ps5()],
        Web(Ok(Vec::new())),
    )
}

pub fn app(tools: Toolbox) -> (Router, AppState) {
    let graph = RepairGraph::builder(tools).build().unwrap();
    let auth = HeaderAuthenticator::new()
        .with_token(ALICE, "alice")
        .with_token(BOB, "bob");
    let state = AppState::new(graph, Arc::new(auth));
    (router(state.clone()), state)
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Decodes the `data:` records of a Server-Sent Events body.
pub fn sse_events(body: &str) -> Vec<StreamEvent> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}
