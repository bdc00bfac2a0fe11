use anyhow::Context as _;
use loadrep_core::ScenarioResult;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, BufReader};
use tokio::sync::mpsc;

use crate::cli::ReportArgs;
use crate::config::{ConfigFile, ReportConfig, load_config_file};
use crate::exit_codes::ExitCode;
use crate::logging;
use crate::record::parse_line;
use crate::run_error::RunError;

type Input = Box<dyn AsyncBufRead + Unpin + Send>;

pub async fn run(args: ReportArgs) -> Result<ExitCode, RunError> {
    let file = match &args.config {
        Some(path) => load_config_file(path).await.map_err(RunError::InvalidInput)?,
        None => ConfigFile::default(),
    };
    let cfg = ReportConfig::resolve(&args, file).map_err(RunError::InvalidInput)?;
    logging::init(cfg.log_level.as_deref()).map_err(RunError::InvalidInput)?;

    let input = open_input(&args.input).await?;

    let mut reporter = loadrep_core::output_service(cfg.output, cfg.policy.clone());
    reporter.init(cfg.debug)?;
    let done = reporter
        .done_chan()
        .context("output service has no completion signal")
        .map_err(RunError::RuntimeError)?;

    tracing::debug!(
        output = %cfg.output,
        debug = cfg.debug,
        policy = %cfg.policy,
        capacity = cfg.channel_capacity,
        "starting report"
    );

    let (tx, rx) = mpsc::channel(cfg.channel_capacity);
    let consumer = tokio::spawn(async move { reporter.start(rx).await });

    // The sender must outlive a failed read, otherwise the reporter would see a
    // closed channel and write a partial report.
    let fed = feed(input, &tx).await;
    if let Err(err) = fed {
        consumer.abort();
        return Err(err);
    }
    drop(tx);

    let signalled = done.await.is_ok();
    consumer
        .await
        .context("reporter task failed")
        .map_err(RunError::RuntimeError)??;

    if !signalled {
        return Err(RunError::RuntimeError(anyhow::anyhow!(
            "reporter finished without signalling completion"
        )));
    }

    Ok(ExitCode::Success)
}

async fn open_input(path: &Path) -> Result<Input, RunError> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }

    let f = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open input: {}", path.display()))
        .map_err(RunError::InvalidInput)?;
    Ok(Box::new(BufReader::new(f)))
}

/// Streams parsed records into `tx` until EOF or until the reporter hangs up.
async fn feed(input: Input, tx: &mpsc::Sender<ScenarioResult>) -> Result<u64, RunError> {
    let mut lines = input.lines();
    let mut line_no = 0u64;
    let mut sent = 0u64;

    loop {
        line_no += 1;
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                return Err(RunError::InvalidInput(
                    anyhow::Error::new(err).context(format!("invalid record on line {line_no}")),
                ));
            }
            Err(err) => {
                return Err(RunError::RuntimeError(
                    anyhow::Error::new(err).context("failed to read input"),
                ));
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_line(&line)
            .with_context(|| format!("invalid record on line {line_no}"))
            .map_err(RunError::InvalidInput)?;

        if tx.send(record).await.is_err() {
            tracing::debug!(line = line_no, "reporter stopped accepting records");
            break;
        }
        sent += 1;
    }

    tracing::debug!(records = sent, "input exhausted");
    Ok(sent)
}
