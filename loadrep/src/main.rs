mod cli;
mod config;
mod exit_codes;
mod logging;
mod record;
mod run;
mod run_error;

use clap::Parser;
use clap::error::ErrorKind;
use mimalloc::MiMalloc;

use crate::exit_codes::ExitCode;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Help and version requests are not failures.
fn parse_exit_code(kind: ErrorKind) -> ExitCode {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
        _ => ExitCode::InvalidInput,
    }
}

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            let _ = err.print();
            std::process::exit(parse_exit_code(err.kind()).as_i32());
        }
    };

    let code = match cli.command {
        cli::Command::Report(args) => run::run(args).await.unwrap_or_else(|err| {
            eprintln!("{err}");
            err.exit_code()
        }),
    };

    std::process::exit(code.as_i32());
}
