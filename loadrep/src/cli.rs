use clap::{Args, Parser, Subcommand};
use loadrep_core::{OutputType, SuccessPolicy, parse_output_type};
use std::path::PathBuf;

fn parse_success_policy(input: &str) -> Result<SuccessPolicy, String> {
    input.parse().map_err(|err| format!("{err}"))
}

fn parse_channel_capacity(input: &str) -> Result<usize, String> {
    let n: usize = input
        .trim()
        .parse()
        .map_err(|_| format!("invalid channel capacity '{input}' (expected a positive integer)"))?;
    if n == 0 {
        return Err("channel capacity must be a positive integer".to_string());
    }
    Ok(n)
}

#[derive(Debug, Parser)]
#[command(
    name = "loadrep",
    author,
    version,
    about = "Aggregate load-test results into a JSON report",
    long_about = "loadrep reads scenario results (one JSON object per line) and folds them into a summary report: success/fail percentages, per-step status and error histograms, and mean phase durations.\n\nIn debug mode the literal request/response exchange of every step is printed instead.",
    after_help = "Examples:\n  loadrep report results.ndjson\n  loadrep report - --debug < single-run.ndjson\n  loadrep report results.ndjson --success-status 200-299\n  loadrep report results.ndjson --config loadrep.yaml"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a report from recorded scenario results
    #[command(
        long_about = "Read scenario results from INPUT and write the report to stdout.\n\nCLI flags override values from the config file."
    )]
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// NDJSON file with one scenario result per line (`-` reads stdin)
    pub input: PathBuf,

    /// Output backend
    #[arg(long, value_name = "NAME", value_parser = parse_output_type)]
    pub output: Option<OutputType>,

    /// Print literal request/response exchanges instead of the summary
    #[arg(long)]
    pub debug: bool,

    /// Inclusive status range counted as success (e.g. 200-399)
    #[arg(long, value_name = "LO-HI", value_parser = parse_success_policy)]
    pub success_status: Option<SuccessPolicy>,

    /// Capacity of the channel between the reader and the reporter
    #[arg(long, value_name = "N", value_parser = parse_channel_capacity)]
    pub channel_capacity: Option<usize>,

    /// YAML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter for stderr (e.g. `debug`, `loadrep_core=trace`); defaults to `RUST_LOG`
    #[arg(long, value_name = "FILTER", env = "LOADREP_LOG")]
    pub log_level: Option<String>,
}
