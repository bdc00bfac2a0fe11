#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Bad flags, config file, or input records.
    InvalidInput = 30,

    /// I/O failures and reporter errors (e.g. a debug run without captured exchanges).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
