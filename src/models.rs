use serde::{Deserialize, Deserializer, Serialize};
use serde_with::skip_serializing_none;

/// Which post categories a visual search covers.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Lost,
    Found,
    Both,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Lost,
    Found,
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Lost => "Lost",
            ItemKind::Found => "Found",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VisualSearchRequest {
    #[serde(rename = "imageBase64")]
    pub image_base64: String,
    #[serde(rename = "searchType")]
    pub search_type: SearchScope,
}

impl VisualSearchRequest {
    /// The client never narrows the scope; every search covers both kinds.
    pub fn both(image_base64: impl Into<String>) -> Self {
        Self { image_base64: image_base64.into(), search_type: SearchScope::Both }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VisualSearchResponse {
    pub success: bool,
    #[serde(default)]
    pub items: Option<Vec<SimilarItem>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One ranked post as returned by the search service. Order is the service's.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimilarItem {
    #[serde(default, alias = "_id")]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub specific_location: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "similarity_score", default, deserialize_with = "score_0_100")]
    pub similarity_score: Option<u8>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

// Scores arrive as ints or floats depending on the ranking backend.
fn score_0_100<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|v| v.is_finite()).map(|v| v.round().clamp(0.0, 100.0) as u8))
}

/// Normalized result of one search round-trip, as the controller sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Items(Vec<SimilarItem>),
    /// `success: false` from the service, with its message if it sent one.
    Rejected(Option<String>),
    /// Network failure or an unreadable body.
    Unreachable,
}

impl From<VisualSearchResponse> for SearchOutcome {
    fn from(resp: VisualSearchResponse) -> Self {
        if resp.success {
            SearchOutcome::Items(resp.items.unwrap_or_default())
        } else {
            SearchOutcome::Rejected(resp.message.filter(|m| !m.trim().is_empty()))
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowState {
    #[default]
    Idle,
    Previewed,
    Searching,
    Succeeded,
    Failed,
}

impl WorkflowState {
    pub fn can_search(self) -> bool {
        matches!(self, WorkflowState::Previewed | WorkflowState::Succeeded | WorkflowState::Failed)
    }
}
