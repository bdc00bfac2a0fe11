use crate::reporter::ReporterState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode json body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode report: {0}")]
    Encode(#[source] serde_json::Error),

    /// The execution engine did not capture request/response materials for a step.
    #[error("step {step_id}: debug info was not captured")]
    MissingDebugInfo { step_id: u16 },

    #[error("step {step_id}: debug info is missing `{field}`")]
    MissingDebugField { step_id: u16, field: &'static str },

    #[error("reporter cannot `{op}` while {from}")]
    InvalidTransition {
        from: ReporterState,
        op: &'static str,
    },

    #[error("invalid success status range `{0}` (expected LO-HI, e.g. 200-399)")]
    InvalidSuccessRange(String),
}
