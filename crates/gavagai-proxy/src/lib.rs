//! Server half of the Gavagai insights endpoint.
//!
//! Accepts `POST /api/v1/gavagai/insights` from dashboard panels, forwards the
//! project lookup to the upstream Gavagai API, and wraps the upstream document
//! in the `{ "result": ... }` envelope the panel client expects.

use anyhow::{bail, Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use gavagai_api::{INSIGHTS_ENDPOINT, INSIGHTS_HEALTH_ENDPOINT};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

const ERROR_INVALID_REQUEST: &str = "gavagai_invalid_request";
const ERROR_UPSTREAM_REQUEST_FAILED: &str = "gavagai_upstream_request_failed";
const ERROR_UPSTREAM_STATUS: &str = "gavagai_upstream_status";
const ERROR_UPSTREAM_MALFORMED: &str = "gavagai_upstream_malformed_response";

#[derive(Debug, Clone)]
/// Public struct `InsightsProxyConfig` used by the `gavagai serve` command.
pub struct InsightsProxyConfig {
    pub bind: String,
    pub upstream_base_url: String,
    pub access_token: String,
    pub request_timeout_ms: u64,
}

impl Default for InsightsProxyConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8789".to_string(),
            upstream_base_url: String::new(),
            access_token: String::new(),
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyInsightsRequest {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    texts: Option<Vec<String>>,
}

#[derive(Clone)]
struct InsightsProxyState {
    client: Client,
    upstream_base_url: Url,
    access_token: String,
}

impl InsightsProxyState {
    fn from_config(config: &InsightsProxyConfig) -> Result<Self> {
        let upstream_base_url = config.upstream_base_url.trim();
        if upstream_base_url.is_empty() {
            bail!("--gavagai-api-url must be provided");
        }
        let upstream_base_url = Url::parse(upstream_base_url)
            .with_context(|| format!("invalid --gavagai-api-url '{upstream_base_url}'"))?;
        if upstream_base_url.cannot_be_a_base() {
            bail!("--gavagai-api-url '{upstream_base_url}' cannot be used as a base url");
        }

        let request_timeout_ms = config.request_timeout_ms.max(1_000);
        let client = Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms))
            .build()
            .context("failed to construct reqwest client for insights proxy")?;

        Ok(Self {
            client,
            upstream_base_url,
            access_token: config.access_token.trim().to_string(),
        })
    }

    fn project_url(&self, project_id: &str) -> Result<Url> {
        let mut url = self.upstream_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("upstream url cannot be a base"))?
            .pop_if_empty()
            .extend(["projects", project_id]);
        Ok(url)
    }
}

/// Run the insights proxy server until Ctrl-C.
pub async fn run_insights_proxy(config: InsightsProxyConfig) -> Result<()> {
    let bind_addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid --bind '{}': expected host:port", config.bind))?;
    let state = Arc::new(InsightsProxyState::from_config(&config)?);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind insights proxy on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve insights proxy listen address")?;

    tracing::info!(
        addr = %local_addr,
        upstream = %state.upstream_base_url,
        "insights proxy listening"
    );

    let app = router_with_state(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("insights proxy server exited unexpectedly")?;
    Ok(())
}

/// Build the proxy router without binding a socket.
pub fn build_insights_proxy_router(config: &InsightsProxyConfig) -> Result<Router> {
    let state = Arc::new(InsightsProxyState::from_config(config)?);
    Ok(router_with_state(state))
}

fn router_with_state(state: Arc<InsightsProxyState>) -> Router {
    Router::new()
        .route(INSIGHTS_HEALTH_ENDPOINT, get(handle_health))
        .route(INSIGHTS_ENDPOINT, post(handle_insights))
        .with_state(state)
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "code": code,
                "message": message.into(),
            }
        })),
    )
        .into_response()
}

async fn handle_health(State(state): State<Arc<InsightsProxyState>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "upstream": state.upstream_base_url.as_str(),
        })),
    )
        .into_response()
}

fn parse_insights_request(body: &[u8]) -> Result<(String, ProxyInsightsRequest)> {
    let request: ProxyInsightsRequest =
        serde_json::from_slice(body).context("request body must be a json object")?;
    let project_id = request
        .project_id
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if project_id.is_empty() {
        bail!("'projectId' is required");
    }
    Ok((project_id, request))
}

async fn handle_insights(State(state): State<Arc<InsightsProxyState>>, body: Bytes) -> Response {
    let (project_id, request) = match parse_insights_request(&body) {
        Ok(parsed) => parsed,
        Err(error) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ERROR_INVALID_REQUEST,
                format!("{error:#}"),
            );
        }
    };
    tracing::debug!(
        project_id = project_id.as_str(),
        topic = request.topic.as_deref().unwrap_or_default(),
        sentiment = request.sentiment.as_deref().unwrap_or_default(),
        texts = request.texts.as_ref().map(Vec::len).unwrap_or_default(),
        "insights request received"
    );

    let url = match state.project_url(&project_id) {
        Ok(url) => url,
        Err(error) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ERROR_INVALID_REQUEST,
                error.to_string(),
            );
        }
    };

    let started = Instant::now();
    let upstream_response = match state
        .client
        .get(url.clone())
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {}", state.access_token))
        .send()
        .await
    {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(upstream = %url, error = %error, "gavagai upstream request failed");
            return error_response(
                StatusCode::BAD_GATEWAY,
                ERROR_UPSTREAM_REQUEST_FAILED,
                format!("Unable to reach the Gavagai API: {error}"),
            );
        }
    };

    let status = upstream_response.status();
    tracing::debug!(
        upstream = %url,
        status = status.as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "gavagai upstream responded"
    );
    if !status.is_success() {
        tracing::warn!(
            upstream = %url,
            status = status.as_u16(),
            "gavagai upstream rejected request"
        );
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": {
                    "code": ERROR_UPSTREAM_STATUS,
                    "status": status.as_u16(),
                    "message": format!(
                        "Gavagai API returned {} {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("error")
                    ),
                }
            })),
        )
            .into_response();
    }

    match upstream_response.json::<Value>().await {
        Ok(result) => (StatusCode::OK, Json(json!({ "result": result }))).into_response(),
        Err(error) => {
            tracing::warn!(upstream = %url, error = %error, "gavagai upstream body unreadable");
            error_response(
                StatusCode::BAD_GATEWAY,
                ERROR_UPSTREAM_MALFORMED,
                "The Gavagai API returned an unreadable response",
            )
        }
    }
}
