//! Fetched page content

use serde::{Deserialize, Serialize};

/// Normalized page content handed to the analysis tiers
///
/// `structure` and `image_metadata` are JSON documents encoded as strings so
/// they can be passed to the model verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub text_content: String,
    pub structure: String,
    pub image_metadata: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_html: Option<String>,
}

impl ScrapeResult {
    /// Error-shaped payload for a page that could not be retrieved
    ///
    /// Upstream failures are carried as data so downstream stages always
    /// receive a value.
    pub fn failed(url: &str, reason: &str) -> Self {
        Self {
            text_content: format!("Failed to scrape {}: {}", url, reason),
            structure: serde_json::json!({ "error": reason }).to_string(),
            image_metadata: "[]".to_string(),
            raw_html: None,
        }
    }
}
