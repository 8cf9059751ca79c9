use fixchain_core::sanitize::{sanitize_devices, sanitize_guide_listing};
use fixchain_core::{
    Device, DeviceSearch, GuideCatalog, GuideDetail, GuideSummary, RawGuide, ToolError,
};
use tracing::Instrument;

use crate::client::IfixitHttpClient;
use crate::types::{CategoryResponse, SearchResponse};
use crate::IfixitCatalogBuilder;

#[derive(Clone, Debug)]
pub struct IfixitCatalog {
    client: IfixitHttpClient,
    max_devices: usize,
}

impl IfixitCatalog {
    pub(crate) fn new(client: IfixitHttpClient, max_devices: usize) -> Self {
        Self {
            client,
            max_devices,
        }
    }

    pub fn builder() -> IfixitCatalogBuilder {
        IfixitCatalogBuilder::new()
    }

    pub fn client(&self) -> &IfixitHttpClient {
        &self.client
    }
}

/// Category titles use underscores in wiki URLs.
pub(crate) fn category_path(device_id: &str) -> String {
    device_id.trim().replace(' ', "_")
}

#[async_trait::async_trait]
impl DeviceSearch for IfixitCatalog {
    async fn search(&self, query: &str) -> Result<Vec<Device>, ToolError> {
        let span = tracing::info_span!("ifixit_search", query = %query, limit = self.max_devices);
        async move {
            let response: SearchResponse = self
                .client
                .get_typed(&["search", query.trim()], &[("filter", "device")])
                .await
                .map_err(|err| err.into_tool_error(query))?;

            let devices = response
                .results
                .into_iter()
                .map(|result| Device {
                    name: result
                        .display_title
                        .filter(|title| !title.trim().is_empty())
                        .unwrap_or_else(|| result.title.clone()),
                    id: result.title,
                })
                .collect();
            let devices = sanitize_devices(devices, self.max_devices);
            tracing::info!(count = devices.len(), "devices found");
            Ok(devices)
        }
        .instrument(span)
        .await
    }
}

#[async_trait::async_trait]
impl GuideCatalog for IfixitCatalog {
    async fn list(&self, device_id: &str) -> Result<Vec<GuideSummary>, ToolError> {
        let span = tracing::info_span!("ifixit_list_guides", device_id = %device_id);
        async move {
            let category = category_path(device_id);
            let response: CategoryResponse = self
                .client
                .get_typed(&["wikis", "CATEGORY", &category], &[])
                .await
                .map_err(|err| err.into_tool_error(device_id))?;

            let guides = response
                .guides
                .into_iter()
                .filter_map(|guide| {
                    Some(GuideSummary {
                        id: guide.guideid?,
                        title: guide.title,
                        summary: guide
                            .summary
                            .filter(|summary| !summary.trim().is_empty())
                            .or(guide.subject)
                            .unwrap_or_default(),
                    })
                })
                .collect();
            let guides = sanitize_guide_listing(guides);
            tracing::info!(count = guides.len(), "guides listed");
            Ok(guides)
        }
        .instrument(span)
        .await
    }
}

#[async_trait::async_trait]
impl GuideDetail for IfixitCatalog {
    async fn fetch(&self, guide_id: u64) -> Result<RawGuide, ToolError> {
        let span = tracing::info_span!("ifixit_fetch_guide", guide_id);
        async move {
            let id = guide_id.to_string();
            let value = self
                .client
                .get_json(&["guides", &id])
                .await
                .map_err(|err| err.into_tool_error(&id))?;
            if !value.is_object() {
                return Err(ToolError::malformed(
                    crate::TOOL_NAME,
                    "guide payload is not an object",
                ));
            }
            Ok(RawGuide::new(value))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::category_path;

    #[test]
    fn category_path_uses_underscores() {
        assert_eq!(category_path(" PlayStation 5 "), "PlayStation_5");
        assert_eq!(category_path("iPhone_12"), "iPhone_12");
    }
}
