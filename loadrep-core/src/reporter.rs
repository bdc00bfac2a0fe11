use async_trait::async_trait;
use std::io::Write;
use tokio::sync::{mpsc, oneshot};

use crate::aggregate::{RunResult, SuccessPolicy, fold};
use crate::debug::DebugDocument;
use crate::error::{Error, Result};
use crate::report::ReportView;
use crate::types::ScenarioResult;

/// Contract every output backend implements.
///
/// Call order is `init`, then `done_chan` (once), then `start`. `start` returns
/// when the input channel is closed and the report is written; the completion
/// signal fires right before it returns successfully.
#[async_trait]
pub trait OutputService: Send {
    fn init(&mut self, debug: bool) -> Result<()>;

    async fn start(&mut self, input: mpsc::Receiver<ScenarioResult>) -> Result<()>;

    /// Read-once completion signal. Subsequent calls return `None`.
    fn done_chan(&mut self) -> Option<oneshot::Receiver<()>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ReporterState {
    Created,
    Initialized,
    Running,
    Done,
}

/// Writes a JSON report into `W`: one summary line in normal mode, or one
/// pretty-printed document of literal exchanges in debug mode.
pub struct JsonReporter<W> {
    sink: W,
    policy: SuccessPolicy,
    state: ReporterState,
    debug: bool,
    result: RunResult,
    done_tx: Option<oneshot::Sender<()>>,
    done_rx: Option<oneshot::Receiver<()>>,
}

impl<W: Write + Send> JsonReporter<W> {
    pub fn new(sink: W, policy: SuccessPolicy) -> Self {
        Self {
            sink,
            policy,
            state: ReporterState::Created,
            debug: false,
            result: RunResult::new(),
            done_tx: None,
            done_rx: None,
        }
    }

    pub fn state(&self) -> ReporterState {
        self.state
    }

    pub fn result(&self) -> &RunResult {
        &self.result
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn into_sink(self) -> W {
        self.sink
    }

    async fn listen_and_aggregate(&mut self, input: &mut mpsc::Receiver<ScenarioResult>) {
        let mut records = 0u64;
        while let Some(record) = input.recv().await {
            fold(&mut self.result, &record, &self.policy);
            records += 1;
        }
        tracing::debug!(records, steps = self.result.steps.len(), "input closed");
    }

    fn report(&mut self) -> Result<()> {
        let view = ReportView::from(&self.result);
        serde_json::to_writer(&mut self.sink, &view).map_err(Error::Encode)?;
        writeln!(self.sink)?;
        self.sink.flush()?;
        Ok(())
    }

    async fn print_in_debug_mode(
        &mut self,
        input: &mut mpsc::Receiver<ScenarioResult>,
    ) -> Result<()> {
        // Exactly one scenario run is expected here; extra runs overwrite entries
        // that share a step id.
        let mut doc = DebugDocument::default();
        while let Some(record) = input.recv().await {
            doc.push(&record)?;
        }

        serde_json::to_writer_pretty(&mut self.sink, &doc).map_err(Error::Encode)?;
        writeln!(self.sink)?;
        self.sink.flush()?;
        Ok(())
    }

    fn transition(&mut self, from: ReporterState, to: ReporterState, op: &'static str) -> Result<()> {
        if self.state != from {
            return Err(Error::InvalidTransition {
                from: self.state,
                op,
            });
        }
        self.state = to;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> OutputService for JsonReporter<W> {
    fn init(&mut self, debug: bool) -> Result<()> {
        self.transition(ReporterState::Created, ReporterState::Initialized, "init")?;

        let (tx, rx) = oneshot::channel();
        self.done_tx = Some(tx);
        self.done_rx = Some(rx);
        self.result = RunResult::new();
        self.debug = debug;
        Ok(())
    }

    async fn start(&mut self, mut input: mpsc::Receiver<ScenarioResult>) -> Result<()> {
        self.transition(ReporterState::Initialized, ReporterState::Running, "start")?;
        tracing::debug!(debug = self.debug, "reporter started");

        let outcome = if self.debug {
            self.print_in_debug_mode(&mut input).await
        } else {
            self.listen_and_aggregate(&mut input).await;
            self.report()
        };

        self.state = ReporterState::Done;
        let done = self.done_tx.take();
        outcome?;

        if let Some(tx) = done {
            // The caller may have stopped listening; the report is already written.
            let _ = tx.send(());
        }
        Ok(())
    }

    fn done_chan(&mut self) -> Option<oneshot::Receiver<()>> {
        self.done_rx.take()
    }
}
