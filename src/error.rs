use thiserror::Error;

use crate::core::job::Job;

/// Status codes shared by the synchronous API, the stack request seam and
/// the result fields of stack events.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    #[error("Null pointer")]
    NullPointer,

    #[error("Invalid parameter")]
    InvalidParameter,

    #[error("Invalid state")]
    InvalidState,

    #[error("Invalid configuration")]
    InvalidConfiguration,

    #[error("Invalid count")]
    InvalidCount,

    #[error("Allocation failed")]
    AllocationFailed,

    #[error("Not found")]
    NotFound,

    #[error("Busy")]
    Busy,

    #[error("No more resources")]
    NoMoreResource,

    #[error("Failed")]
    Fail,

    #[error("Timed out")]
    Timeout,

    #[error("Aborted")]
    Abort,

    #[error("In progress")]
    InProgress,

    #[error("Stack status 0x{0:04x}")]
    Stack(u16),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Result embedded in terminal stack events.
pub type StackResult = std::result::Result<(), Error>;

/// Returned when a job could not be handed to the distributor.
///
/// The job comes back to the caller unless it was auto-destroyed.
#[derive(Debug)]
pub struct SubmitError {
    pub error: Error,
    pub job: Option<Box<Job>>,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Job submission failed: {}", self.error)
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
