//! apicov: API coverage analysis and test scenario synthesis.
//!
//! Reads an API description and a snapshot of existing tests, reports which
//! endpoints the tests already reach, and synthesizes ordered scenario
//! descriptors for every endpoint.
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod analysis;
mod categorize;
mod cli;
mod config;
mod corpus;
mod coverage;
mod diagnostics;
mod endpoint;
mod error;
mod extract;
mod output;
mod path;
mod payload;
mod report;
mod scenarios;
mod schema;
mod util;
mod workflow;

const LOG_ENV: &str = "APICOV_LOG";

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    init_tracing(args.verbose);
    match args.command {
        cli::Command::Init(args) => workflow::run_init(args),
        cli::Command::Endpoints(args) => workflow::run_endpoints(args),
        cli::Command::Coverage(args) => workflow::run_coverage(args),
        cli::Command::Scenarios(args) => workflow::run_scenarios(args),
        cli::Command::Report(args) => workflow::run_report(args),
    }
}
