//! Command-line surface for the Gavagai insights proxy and panel runner.
//!
//! Exposes clap-backed argument models plus the command implementations used
//! by the `gavagai` binary.

pub mod cli_args;
pub mod commands;

pub use cli_args::{Cli, CliCommand, CliInsightsCache, InsightsArgs, ServeArgs};
pub use commands::{execute_insights, load_panel_props, run_cli, InsightsRun};
