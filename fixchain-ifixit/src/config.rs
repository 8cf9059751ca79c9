use std::time::Duration;

use crate::client::IfixitHttpClient;
use crate::{IfixitCatalog, IfixitError};

pub const IFIXIT_BASE_URL: &str = "https://www.ifixit.com/api/2.0";

pub struct IfixitCatalogBuilder {
    base_url: String,
    timeout: Duration,
    max_devices: usize,
}

impl Default for IfixitCatalogBuilder {
    fn default() -> Self {
        Self {
            base_url: IFIXIT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_devices: 5,
        }
    }
}

impl IfixitCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = value.into();
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = value;
        self
    }

    pub fn max_devices(mut self, value: usize) -> Self {
        self.max_devices = value;
        self
    }

    pub fn build(self) -> Result<IfixitCatalog, IfixitError> {
        if self.max_devices == 0 {
            return Err(IfixitError::Config(
                "max_devices must be at least 1".to_string(),
            ));
        }
        let client = IfixitHttpClient::new(&self.base_url, self.timeout)?;
        Ok(IfixitCatalog::new(client, self.max_devices))
    }
}
