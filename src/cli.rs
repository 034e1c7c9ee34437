//! CLI argument parsing.
//!
//! The CLI is thin: it resolves inputs from disk and hands plain values to
//! the analysis engine, so the same logic can be driven from tests.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "apicov",
    version,
    about = "API coverage analysis and test scenario synthesis",
    after_help = "Commands:\n  init --out <file>                         Write the default analysis config\n  endpoints --spec <file>                   List categorized endpoints\n  coverage --spec <file> --corpus <dir>     Compare spec endpoints to existing tests\n  scenarios --spec <file>                   Synthesize test scenarios per endpoint\n  report --spec <file> --corpus <dir>       Full aggregated report\n\nExamples:\n  apicov init --out apicov.json\n  apicov coverage --spec openapi.yaml --corpus cypress/e2e\n  apicov scenarios --spec collection.json --endpoint 'POST /domains'\n  apicov report --spec openapi.yaml --corpus cypress/e2e --out report.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log progress to stderr (overridden by APICOV_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Endpoints(EndpointsArgs),
    Coverage(CoverageArgs),
    Scenarios(ScenariosArgs),
    Report(ReportArgs),
}

/// Inputs shared by every analysis command.
#[derive(Args, Debug)]
pub struct SpecArgs {
    /// API description document (OpenAPI or collection; JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub spec: PathBuf,

    /// Analysis config JSON (defaults when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write output here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Write the default analysis config")]
pub struct InitArgs {
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "List categorized, prioritized endpoints")]
pub struct EndpointsArgs {
    #[command(flatten)]
    pub spec: SpecArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Compare spec endpoints against an existing test corpus")]
pub struct CoverageArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Directory (or single file) of existing test artifacts
    #[arg(long, value_name = "DIR")]
    pub corpus: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Synthesize ordered test scenarios per endpoint")]
pub struct ScenariosArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Only this endpoint, e.g. "POST /domains"
    #[arg(long, value_name = "KEY")]
    pub endpoint: Option<String>,

    /// Only endpoints in this category
    #[arg(long, value_name = "NAME")]
    pub category: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "Full report: categories, coverage, scenarios, diagnostics")]
pub struct ReportArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    #[arg(long, value_name = "DIR")]
    pub corpus: PathBuf,
}
