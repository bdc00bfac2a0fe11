use std::io::Write;
use std::str::FromStr as _;

use strum::VariantNames as _;

use crate::aggregate::SuccessPolicy;
use crate::reporter::{JsonReporter, OutputService};

pub type Sink = Box<dyn Write + Send>;

/// Output backends selectable by name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::VariantNames,
)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputType {
    /// Aggregated JSON summary (or a verbose debug document) on stdout.
    StdoutJson,
}

pub fn available_output_services() -> &'static [&'static str] {
    OutputType::VARIANTS
}

pub fn parse_output_type(s: &str) -> Result<OutputType, String> {
    let s = s.trim();
    OutputType::from_str(s).map_err(|_| {
        format!(
            "unsupported output '{s}'. Available outputs: {}",
            available_output_services().join(", ")
        )
    })
}

pub fn output_service(kind: OutputType, policy: SuccessPolicy) -> Box<dyn OutputService> {
    match kind {
        OutputType::StdoutJson => output_service_with_sink(kind, policy, Box::new(std::io::stdout())),
    }
}

/// Same as [`output_service`] but writes into `sink` instead of the process stdout.
pub fn output_service_with_sink(
    kind: OutputType,
    policy: SuccessPolicy,
    sink: Sink,
) -> Box<dyn OutputService> {
    match kind {
        OutputType::StdoutJson => Box::new(JsonReporter::new(sink, policy)),
    }
}
