use std::sync::Arc;

use anyhow::{bail, Context, Result};
use gavagai_api::{HttpInsightsClient, HttpInsightsClientConfig};
use gavagai_panel::{
    DisabledInsightsStore, FetchError, FetchSuccess, InsightsPanel, InsightsStore,
    MemoryInsightsStore, Notifier, PanelProps, RenderState,
};
use gavagai_proxy::{run_insights_proxy, InsightsProxyConfig};

use crate::{Cli, CliCommand, CliInsightsCache, InsightsArgs, ServeArgs};

/// Outcome of one `gavagai insights` run.
#[derive(Debug)]
pub struct InsightsRun {
    pub render: RenderState,
    pub outcome: Result<FetchSuccess, FetchError>,
}

pub async fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        CliCommand::Serve(args) => run_serve(args).await,
        CliCommand::Insights(args) => {
            let notifier = |message: &str| eprintln!("error: {message}");
            let run = execute_insights(&args, &notifier).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&run.render)
                    .context("failed to encode panel render state")?
            );
            if let Err(error) = run.outcome {
                bail!("insights fetch {}: {}", error.kind.as_str(), error.message);
            }
            Ok(())
        }
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    run_insights_proxy(InsightsProxyConfig {
        bind: args.bind,
        upstream_base_url: args.gavagai_api_url,
        access_token: args.access_token,
        request_timeout_ms: args.request_timeout_ms,
    })
    .await
}

pub fn load_panel_props(args: &InsightsArgs) -> Result<PanelProps> {
    let raw = std::fs::read_to_string(&args.props)
        .with_context(|| format!("failed to read panel props '{}'", args.props.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse panel props '{}'", args.props.display()))
}

fn build_store(mode: CliInsightsCache) -> Arc<dyn InsightsStore> {
    match mode {
        CliInsightsCache::Memory => Arc::new(MemoryInsightsStore::new()),
        CliInsightsCache::Disabled => Arc::new(DisabledInsightsStore),
    }
}

/// Load props, trigger one fetch, and collect the resulting render state.
pub async fn execute_insights(
    args: &InsightsArgs,
    notifier: &dyn Notifier,
) -> Result<InsightsRun> {
    let props = load_panel_props(args)?;
    let client = HttpInsightsClient::new(HttpInsightsClientConfig {
        api_base: args.api_base.clone(),
        request_timeout_ms: args.request_timeout_ms,
        auth_token: args.auth_token.clone(),
    })
    .context("failed to construct insights client")?;
    tracing::debug!(
        url = client.insights_url(),
        cache = ?args.insights_cache,
        "running insights panel"
    );

    let panel = InsightsPanel::from_props(
        &props,
        Arc::new(client),
        build_store(args.insights_cache),
    );
    let outcome = panel.fetch_and_notify(notifier).await;
    Ok(InsightsRun {
        render: panel.render_state(),
        outcome,
    })
}
