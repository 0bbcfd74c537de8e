//! Runtime error types

use alloc::string::{String, ToString};
use core::fmt;

/// Malformed scheduling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidArgument {
    /// Frequency was negative, NaN, infinite or too low for the tick counter
    Frequency(f32),
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidArgument::Frequency(hz) => {
                write!(
                    f,
                    "execution frequency must be finite, >= 0 and at most one run per 2^31 us ({hz})"
                )
            }
        }
    }
}

/// Failure raised by a task body or its pending work
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskError {
    message: String,
}

impl TaskError {
    /// Create an error from anything printable
    pub fn msg(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors surfaced by the runtime
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OsError {
    /// Rejected at registration time, nothing was modified
    InvalidArgument(InvalidArgument),
    /// The task or handler is not registered
    NotRegistered,
    /// A dispatched task failed; fatal to the run loop
    TaskFailure(TaskError),
}

impl From<InvalidArgument> for OsError {
    fn from(e: InvalidArgument) -> Self {
        OsError::InvalidArgument(e)
    }
}

impl From<TaskError> for OsError {
    fn from(e: TaskError) -> Self {
        OsError::TaskFailure(e)
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsError::InvalidArgument(e) => write!(f, "invalid argument: {e}"),
            OsError::NotRegistered => f.write_str("not registered"),
            // Reported verbatim so the fatal message matches the task's own text
            OsError::TaskFailure(e) => write!(f, "{e}"),
        }
    }
}
