use std::sync::Arc;

use crate::{
    Device, FixchainError, GuideSummary, RawGuide, RetryPolicy, Retrying, SearchHit,
    TextCompletion, ToolError,
};

#[async_trait::async_trait]
pub trait DeviceSearch: Send + Sync {
    /// Devices matching `query`, most relevant first.
    async fn search(&self, query: &str) -> Result<Vec<Device>, ToolError>;
}

#[async_trait::async_trait]
pub trait GuideCatalog: Send + Sync {
    async fn list(&self, device_id: &str) -> Result<Vec<GuideSummary>, ToolError>;
}

#[async_trait::async_trait]
pub trait GuideDetail: Send + Sync {
    async fn fetch(&self, guide_id: u64) -> Result<RawGuide, ToolError>;
}

#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    fn name(&self) -> &str;
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError>;
}

/// The external capabilities one pipeline run may call.
#[derive(Clone)]
pub struct Toolbox {
    pub completion: Arc<dyn TextCompletion>,
    pub devices: Arc<dyn DeviceSearch>,
    pub guides: Arc<dyn GuideCatalog>,
    pub details: Arc<dyn GuideDetail>,
    /// Tried in order until one returns hits.
    pub web: Vec<Arc<dyn WebSearch>>,
}

impl Toolbox {
    pub fn builder() -> ToolboxBuilder {
        ToolboxBuilder::default()
    }
}

#[derive(Default)]
pub struct ToolboxBuilder {
    completion: Option<Arc<dyn TextCompletion>>,
    devices: Option<Arc<dyn DeviceSearch>>,
    guides: Option<Arc<dyn GuideCatalog>>,
    details: Option<Arc<dyn GuideDetail>>,
    web: Vec<Arc<dyn WebSearch>>,
    retry: Option<RetryPolicy>,
}

impl ToolboxBuilder {
    pub fn completion(mut self, completion: Arc<dyn TextCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn devices(mut self, devices: Arc<dyn DeviceSearch>) -> Self {
        self.devices = Some(devices);
        self
    }

    pub fn guides(mut self, guides: Arc<dyn GuideCatalog>) -> Self {
        self.guides = Some(guides);
        self
    }

    pub fn details(mut self, details: Arc<dyn GuideDetail>) -> Self {
        self.details = Some(details);
        self
    }

    /// Appends a fallback search adapter; call order is priority order.
    pub fn web_search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.web.push(search);
        self
    }

    /// Wraps the completion and every tool adapter in [`Retrying`] with this policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn build(self) -> Result<Toolbox, FixchainError> {
        let missing = |what: &str| FixchainError::InvalidConfig(format!("toolbox is missing {what}"));
        let mut completion = self.completion.ok_or_else(|| missing("a text completion"))?;
        let mut devices = self.devices.ok_or_else(|| missing("a device search adapter"))?;
        let mut guides = self.guides.ok_or_else(|| missing("a guide catalog adapter"))?;
        let mut details = self.details.ok_or_else(|| missing("a guide detail adapter"))?;
        let mut web = self.web;
        if web.is_empty() {
            return Err(missing("a fallback search adapter"));
        }

        if let Some(policy) = self.retry {
            completion = Arc::new(Retrying::new(completion, policy)) as Arc<dyn TextCompletion>;
            devices = Arc::new(Retrying::new(devices, policy)) as Arc<dyn DeviceSearch>;
            guides = Arc::new(Retrying::new(guides, policy)) as Arc<dyn GuideCatalog>;
            details = Arc::new(Retrying::new(details, policy)) as Arc<dyn GuideDetail>;
            web = web
                .into_iter()
                .map(|search| Arc::new(Retrying::new(search, policy)) as Arc<dyn WebSearch>)
                .collect();
        }

        Ok(Toolbox {
            completion,
            devices,
            guides,
            details,
            web,
        })
    }
}
