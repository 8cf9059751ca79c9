use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A product entry in the repair-guide catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Catalog key used to list the device's guides.
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideRef {
    pub id: u64,
    pub title: String,
}

impl From<&GuideSummary> for GuideRef {
    fn from(guide: &GuideSummary) -> Self {
        Self {
            id: guide.id,
            title: guide.title.clone(),
        }
    }
}

/// Guide detail exactly as the catalog returned it, extra metadata included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawGuide(pub Value);

impl RawGuide {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideStep {
    /// 1-based, contiguous within a guide.
    pub order: u32,
    pub text: String,
    pub image_urls: Vec<String>,
    pub tools: BTreeSet<String>,
    pub parts: BTreeSet<String>,
}

/// Guide body reduced to what the answer formatter needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedGuideContent {
    pub title: String,
    pub subject: String,
    pub introduction: String,
    pub difficulty: String,
    pub time_required: String,
    pub tools: BTreeSet<String>,
    pub parts: BTreeSet<String>,
    pub steps: Vec<GuideStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// What the answer is built from: a verified guide or unverified search hits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum RepairContent {
    Official(SanitizedGuideContent),
    Community {
        query: String,
        hits: Vec<SearchHit>,
    },
}

impl RepairContent {
    pub fn is_official(&self) -> bool {
        matches!(self, Self::Official(_))
    }
}
