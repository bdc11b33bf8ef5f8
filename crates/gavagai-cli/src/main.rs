mod bootstrap_helpers;

use anyhow::Result;
use clap::Parser;
use gavagai_cli::{run_cli, Cli};

use crate::bootstrap_helpers::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await
}
