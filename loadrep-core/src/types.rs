use bytes::Bytes;
use http::{HeaderMap, Method};
use std::collections::BTreeMap;
use std::time::Duration;

/// Internal phase names used as keys of [`ScenarioStepResult::durations`].
pub mod phase {
    pub const DNS: &str = "dnsDuration";
    pub const CONNECTION: &str = "connDuration";
    pub const TLS: &str = "tlsDuration";
    pub const REQUEST_WRITE: &str = "reqDuration";
    pub const SERVER_PROCESSING: &str = "serverProcessDuration";
    pub const RESPONSE_READ: &str = "resDuration";
    /// Whole step, from the first byte sent to the last byte read.
    pub const TOTAL: &str = "duration";
}

/// One completed run of a scenario.
#[derive(Debug, Clone, Default)]
pub struct ScenarioResult {
    pub steps: Vec<ScenarioStepResult>,
}

impl ScenarioResult {
    /// Sum of the `duration` phase over all steps, in seconds.
    ///
    /// Summed as `f64`: step totals can add up past what a `Duration` holds.
    pub fn total_secs(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| s.total_duration().as_secs_f64())
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioStepResult {
    /// Unique within a scenario and stable for the whole run.
    pub id: u16,
    pub name: String,
    /// `0` when the request never produced a response.
    pub status_code: u16,
    pub error: Option<StepError>,
    pub durations: BTreeMap<String, Duration>,
    pub debug: Option<DebugInfo>,
}

impl ScenarioStepResult {
    pub fn total_duration(&self) -> Duration {
        self.durations
            .get(phase::TOTAL)
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum StepErrorKind {
    #[strum(serialize = "proxyError")]
    Proxy,
    #[strum(serialize = "connectionError")]
    Connection,
    #[strum(serialize = "dnsError")]
    Dns,
    #[strum(serialize = "tlsError")]
    Tls,
    #[strum(serialize = "timeoutError")]
    Timeout,
    #[strum(serialize = "parseError")]
    Parse,
    #[strum(serialize = "addressError")]
    Address,
    #[strum(serialize = "invalidRequestError")]
    InvalidRequest,
    /// Raised on purpose by the scenario (e.g. a failed assertion).
    #[strum(serialize = "intendedError")]
    Intended,
    #[strum(serialize = "unknownError")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct StepError {
    pub kind: StepErrorKind,
    pub reason: String,
}

impl StepError {
    pub fn new(kind: StepErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Literal request/response materials captured for verbose inspection.
///
/// Response fields are only populated when the request produced a response.
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    pub url: String,
    pub method: Method,
    pub request_headers: HeaderMap,
    pub request_body: Bytes,
    pub response_headers: Option<HeaderMap>,
    pub response_body: Option<Bytes>,
}
