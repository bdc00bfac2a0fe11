//! Streaming aggregation and reporting of load-test results.
//!
//! An execution engine sends one [`ScenarioResult`] per finished scenario run
//! through a channel. An [`OutputService`] drains the channel and, once it is
//! closed, writes either an aggregated summary or (in debug mode) the literal
//! request/response exchange of every step.

pub mod aggregate;
pub mod debug;
pub mod decode;
pub mod duration_keys;
mod error;
pub mod registry;
pub mod report;
pub mod reporter;
pub mod types;

pub use aggregate::{RunResult, RunningMean, StepResultSummary, SuccessPolicy, fold};
pub use debug::{DebugDocument, VerboseHttpRequestInfo, VerboseOutcome};
pub use error::{Error, Result};
pub use registry::{
    OutputType, Sink, available_output_services, output_service, output_service_with_sink,
    parse_output_type,
};
pub use report::{Percentages, ReportView, StepReportView};
pub use reporter::{JsonReporter, OutputService, ReporterState};
pub use types::{DebugInfo, ScenarioResult, ScenarioStepResult, StepError, StepErrorKind, phase};
