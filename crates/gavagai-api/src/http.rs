use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::{InsightsApi, InsightsApiError, InsightsPayload, InsightsResult, INSIGHTS_ENDPOINT};

#[derive(Debug, Clone)]
/// Public struct `HttpInsightsClientConfig` used by insights hosts.
pub struct HttpInsightsClientConfig {
    pub api_base: String,
    pub request_timeout_ms: u64,
    pub auth_token: Option<String>,
}

impl Default for HttpInsightsClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8789".to_string(),
            request_timeout_ms: 30_000,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone)]
/// reqwest-backed `InsightsApi` posting payloads to the insights endpoint.
pub struct HttpInsightsClient {
    client: reqwest::Client,
    insights_url: String,
}

impl HttpInsightsClient {
    pub fn new(config: HttpInsightsClientConfig) -> Result<Self, InsightsApiError> {
        let api_base = config.api_base.trim();
        if api_base.is_empty() {
            return Err(InsightsApiError::InvalidConfig(
                "insights api base cannot be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = config
            .auth_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
        {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                    InsightsApiError::InvalidConfig(format!("invalid auth token header: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self {
            client,
            insights_url: insights_url(api_base),
        })
    }

    pub fn insights_url(&self) -> &str {
        &self.insights_url
    }
}

fn insights_url(api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    if base.ends_with(INSIGHTS_ENDPOINT) {
        return base.to_string();
    }
    format!("{base}{INSIGHTS_ENDPOINT}")
}

#[async_trait]
impl InsightsApi for HttpInsightsClient {
    async fn fetch_insights(
        &self,
        payload: &InsightsPayload,
    ) -> Result<InsightsResult, InsightsApiError> {
        tracing::debug!(
            url = self.insights_url.as_str(),
            project_id = payload.project_id.as_str(),
            topic = payload.topic.as_str(),
            sentiment = payload.sentiment.as_str(),
            "requesting insights"
        );
        let response = self
            .client
            .post(&self.insights_url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "insights request failed");
            return Err(InsightsApiError::HttpStatus {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body: raw,
            });
        }

        parse_insights_response(&raw)
    }
}

fn parse_insights_response(raw: &str) -> Result<InsightsResult, InsightsApiError> {
    let parsed: Value = serde_json::from_str(raw).map_err(|e| {
        InsightsApiError::MalformedResponse(format!("response body is not json: {e}"))
    })?;
    let Value::Object(mut envelope) = parsed else {
        return Err(InsightsApiError::MalformedResponse(
            "response body is not a json object".to_string(),
        ));
    };
    match envelope.remove("result") {
        Some(Value::Null) | None => Err(InsightsApiError::MalformedResponse(
            "response body is missing 'result'".to_string(),
        )),
        Some(result) => Ok(result),
    }
}
