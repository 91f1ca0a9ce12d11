use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::Tool;
use crate::errors::ApiError;

pub const LOOKUP_FALLBACK: &str =
    "Unable to fetch latest information. Using cached data instead.";
pub const LOOKUP_UNAVAILABLE: &str = "Search functionality temporarily unavailable.";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Best-effort web lookup against the DuckDuckGo Instant Answer API.
///
/// Tier 1 is live data, tier 2 a fixed fallback sentence, tier 3 a generic
/// one. The caller never sees an error.
pub struct WebLookupTool {
    client: Option<Client>,
    timeout: Duration,
}

impl WebLookupTool {
    pub fn new(timeout_secs: u64) -> Self {
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let client = Client::builder().timeout(timeout).build().ok();
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn lookup(&self, query: &str) -> Result<String, ApiError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ApiError::Internal("HTTP client unavailable".to_string()))?;

        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_redirect=1&no_html=1",
            urlencoding::encode(query)
        );

        let response = client.get(url).send().await.map_err(ApiError::internal)?;
        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "DuckDuckGo lookup failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        extract_abstract(&payload)
            .ok_or_else(|| ApiError::Internal("Lookup response had no abstract".to_string()))
    }
}

impl Default for WebLookupTool {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

#[async_trait]
impl Tool for WebLookupTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for the latest information related to a topic."
    }

    async fn invoke(&self, query: &str) -> String {
        match self.lookup(query).await {
            Ok(abstract_text) => abstract_text,
            Err(err) => {
                tracing::error!("Web search error: {}", err);
                if self.client.is_some() {
                    LOOKUP_FALLBACK.to_string()
                } else {
                    LOOKUP_UNAVAILABLE.to_string()
                }
            }
        }
    }
}

fn extract_abstract(payload: &Value) -> Option<String> {
    payload
        .get("AbstractText")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
