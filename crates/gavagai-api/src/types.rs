use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::InsightsApiError;

pub const INSIGHTS_ENDPOINT: &str = "/api/v1/gavagai/insights";
pub const INSIGHTS_HEALTH_ENDPOINT: &str = "/api/v1/gavagai/health";

/// Opaque insights document returned by the external service.
pub type InsightsResult = Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
/// Identifying tuple sent to the insights service.
pub struct InsightsPayload {
    pub project_id: String,
    pub topic: String,
    pub sentiment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texts: Option<Vec<String>>,
}

impl InsightsPayload {
    pub fn new(
        project_id: impl Into<String>,
        topic: impl Into<String>,
        sentiment: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            topic: topic.into(),
            sentiment: sentiment.into(),
            texts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Success envelope of `POST /api/v1/gavagai/insights`.
pub struct InsightsResponse {
    pub result: InsightsResult,
}

#[async_trait]
/// Trait contract for fetching insights for one payload.
pub trait InsightsApi: Send + Sync {
    async fn fetch_insights(
        &self,
        payload: &InsightsPayload,
    ) -> Result<InsightsResult, InsightsApiError>;
}
