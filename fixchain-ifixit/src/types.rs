use serde::{Deserialize, Serialize};

/// `GET search/{query}?filter=device`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub display_title: Option<String>,
    #[serde(default, rename = "dataType")]
    pub data_type: String,
}

/// `GET wikis/CATEGORY/{title}`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CategoryResponse {
    #[serde(default)]
    pub guides: Vec<CategoryGuide>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CategoryGuide {
    #[serde(default)]
    pub guideid: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}
