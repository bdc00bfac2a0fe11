use crate::exit_codes::ExitCode;

/// Failure of a `report` run, classified by who has to fix it.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Flags, config file, or input records.
    #[error("{0:#}")]
    InvalidInput(anyhow::Error),
    #[error("{0:#}")]
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }
}

impl From<loadrep_core::Error> for RunError {
    fn from(err: loadrep_core::Error) -> Self {
        Self::RuntimeError(anyhow::Error::new(err).context("report failed"))
    }
}
