use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
/// Enumerates supported `CliInsightsCache` values.
pub enum CliInsightsCache {
    Memory,
    Disabled,
}

#[derive(Debug, Parser)]
#[command(
    name = "gavagai",
    about = "Gavagai insights proxy and dashboard panel runner",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Serve POST /api/v1/gavagai/insights by forwarding to the Gavagai API.
    Serve(ServeArgs),
    /// Load panel props, run one insights fetch, and print the render state.
    Insights(InsightsArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(
        long,
        env = "GAVAGAI_PROXY_BIND",
        default_value = "127.0.0.1:8789",
        help = "Socket address the insights proxy listens on"
    )]
    pub bind: String,

    #[arg(
        long = "gavagai-api-url",
        env = "GAVAGAI_API_URL",
        help = "Base URL of the upstream Gavagai API (projects are fetched from <url>/projects/<id>)"
    )]
    pub gavagai_api_url: String,

    #[arg(
        long = "access-token",
        env = "GAVAGAI_ACCESS_TOKEN",
        default_value = "",
        hide_env_values = true,
        help = "Bearer token sent to the upstream Gavagai API"
    )]
    pub access_token: String,

    #[arg(
        long = "request-timeout-ms",
        env = "GAVAGAI_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Upstream request timeout in milliseconds (minimum 1000)"
    )]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Args)]
pub struct InsightsArgs {
    #[arg(
        long,
        env = "GAVAGAI_PANEL_PROPS",
        help = "Path to a JSON file with the panel props (insightsPayload, filters, ...)"
    )]
    pub props: PathBuf,

    #[arg(
        long = "api-base",
        env = "GAVAGAI_INSIGHTS_API_BASE",
        default_value = "http://127.0.0.1:8789",
        help = "Base URL of the server exposing /api/v1/gavagai/insights"
    )]
    pub api_base: String,

    #[arg(
        long = "auth-token",
        env = "GAVAGAI_INSIGHTS_AUTH_TOKEN",
        hide_env_values = true,
        help = "Optional bearer token for the insights endpoint"
    )]
    pub auth_token: Option<String>,

    #[arg(
        long = "request-timeout-ms",
        env = "GAVAGAI_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Insights request timeout in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "insights-cache",
        env = "GAVAGAI_INSIGHTS_CACHE",
        value_enum,
        default_value_t = CliInsightsCache::Memory,
        help = "Insights store backing the panel: memory keeps results for the process lifetime, disabled always misses"
    )]
    pub insights_cache: CliInsightsCache,
}
