#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::Notify;

use fixchain_core::{
    Device, DeviceSearch, FixchainError, GuideCatalog, GuideDetail, GuideSummary, RawGuide,
    SearchHit, TextCompletion, ToolError, Toolbox, WebSearch,
};

pub struct FixedCompletion {
    reply: Result<String, String>,
    pub calls: AtomicUsize,
}

impl FixedCompletion {
    pub fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err("quota exhausted".to_string()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl TextCompletion for FixedCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, FixchainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(FixchainError::LlmProvider)
    }
}

pub struct FakeDevices {
    result: Result<Vec<Device>, ToolError>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeDevices {
    pub fn new(result: Result<Vec<Device>, ToolError>) -> Arc<Self> {
        Arc::new(Self {
            result,
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl DeviceSearch for FakeDevices {
    async fn search(&self, query: &str) -> Result<Vec<Device>, ToolError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.result.clone()
    }
}

pub struct FakeGuides(pub Result<Vec<GuideSummary>, ToolError>);

#[async_trait::async_trait]
impl GuideCatalog for FakeGuides {
    async fn list(&self, _device_id: &str) -> Result<Vec<GuideSummary>, ToolError> {
        self.0.clone()
    }
}

pub struct FakeDetails(pub Result<RawGuide, ToolError>);

#[async_trait::async_trait]
impl GuideDetail for FakeDetails {
    async fn fetch(&self, _guide_id: u64) -> Result<RawGuide, ToolError> {
        self.0.clone()
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

pub struct FakeWeb {
    name: &'static str,
    result: Result<Vec<SearchHit>, ToolError>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl FakeWeb {
    pub fn new(name: &'static str, result: Result<Vec<SearchHit>, ToolError>) -> Arc<Self> {
        Arc::new(Self {
            name,
            result,
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl WebSearch for FakeWeb {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        self.result.clone()
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
        GuideSummary {
            id: 103,
            title: "PlayStation 5 Teardown".to_string(),
            summary: String::new(),
        },
    ]
}

pub fn ps5_fan_guide() -> RawGuide {
    RawGuide::new(json!({
        "guideid": 102,
        "title": "PlayStation 5 Fan Replacement",
        "subject": "PlayStation 5",
        "difficulty": "Moderate",
        "time_required": "30 minutes",
        "author": {"username": "fixer"},
        "steps": [
            {
                "orderby": 1,
                "title": "Remove the cover",
                "lines": [{"text_raw": "Pull the top corner up."}],
                "media": {"data": [{"standard": "https://guide-images.cdn.ifixit.com/1.jpg"}]}
            },
            {
                "orderby": 2,
                "title": "Remove the fan",
                "lines": [{"text_raw": "Lift the fan out."}]
            }
        ]
    }))
}

pub fn forum_hits() -> Vec<SearchHit> {
    vec![
        SearchHit {
            title: "XQ9000 teardown thread".to_string(),
            snippet: "Someone opened one up".to_string(),
            url: "https://forum.example.com/xq9000".to_string(),
        },
        SearchHit {
            title: "Fixing gadgets".to_string(),
            snippet: "General tips".to_string(),
            url: "https://blog.example.com/gadgets".to_string(),
        },
    ]
}

pub fn toolbox(
    completion: Arc<dyn TextCompletion>,
    devices: Arc<dyn DeviceSearch>,
    guides: Arc<dyn GuideCatalog>,
    details: Arc<dyn GuideDetail>,
    web: Vec<Arc<dyn WebSearch>>,
) -> Toolbox {
    let mut builder = Toolbox::builder()
        .completion(completion)
        .devices(devices)
        .guides(guides)
        .details(details);
    for search in web {
        builder = builder.web_search(search);
    }
    builder.build().unwrap()
}

/// Catalog path that succeeds end to end for the PS5 fan question.
pub fn official_toolbox() -> Toolbox {
    toolbox(
        FixedCompletion::ok("PlayStation 5 fan noise"),
        FakeDevices::new(Ok(vec![ps5()])),
        Arc::new(FakeGuides(Ok(ps5_guides()))),
        Arc::new(FakeDetails(Ok(ps5_fan_guide()))),
        vec![FakeWeb::new("primary", Ok(forum_hits()))],
    )
}
