use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::{VisualSearchRequest, VisualSearchResponse};

pub const VISUAL_SEARCH_PATH: &str = "/api/search/visual";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Anything that can answer a visual search request.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &VisualSearchRequest) -> Result<VisualSearchResponse, SearchError>;
}

// Keeps multi-megabyte data URLs out of the log.
fn preview_payload(data: &str) -> String {
    if data.len() > 60 {
        let head: String = data.chars().take(48).collect();
        format!("{}...[{} chars total]", head, data.len())
    } else {
        data.to_string()
    }
}

pub struct HttpSearchClient {
    client: Client,
    base_url: String,
}

impl HttpSearchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: Client::new(), base_url }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, VISUAL_SEARCH_PATH)
    }
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
    async fn search(&self, request: &VisualSearchRequest) -> Result<VisualSearchResponse, SearchError> {
        let url = self.endpoint();
        info!(
            "🔗 POST {} (searchType={:?}, image={})",
            url,
            request.search_type,
            preview_payload(&request.image_base64)
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        let body = response.text().await.map_err(|e| SearchError::Http(e.to_string()))?;
        if !status.is_success() {
            // The service reports failures in-band too, so the body still gets a chance to parse.
            warn!("⚠️ Visual search returned {}: {}", status, preview_payload(&body));
        }

        serde_json::from_str::<VisualSearchResponse>(&body).map_err(|e| {
            error!("❌ Unreadable visual search response: {}", e);
            SearchError::Parse(format!("{} (status={}, body={})", e, status, preview_payload(&body)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        assert_eq!(HttpSearchClient::new("http://localhost:8001/").endpoint(), "http://localhost:8001/api/search/visual");
        assert_eq!(HttpSearchClient::new("http://api").endpoint(), "http://api/api/search/visual");
    }

    #[test]
    fn payload_preview_is_truncated() {
        let long = format!("data:image/png;base64,{}", "A".repeat(500));
        let preview = preview_payload(&long);
        assert!(preview.starts_with("data:image/png;base64,"));
        assert!(preview.ends_with(&format!("[{} chars total]", long.len())));
        assert_eq!(preview_payload("short"), "short");
    }
}
