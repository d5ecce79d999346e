//! Error types for biskut-runner

use std::time::Duration;
use thiserror::Error;

/// Harness error type
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong extension or missing source file
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Compiler reported failure
    #[error("compilation failed:\n{diagnostics}")]
    Compile {
        /// Combined compiler stdout and stderr
        diagnostics: String,
    },

    /// PTY or child process could not be started
    #[error("failed to start program: {0}")]
    RuntimeStart(String),

    /// Deadline elapsed and the program was killed
    #[error("execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Program ran to completion with a non-zero status
    #[error("program exited with code {0}")]
    NonZeroExit(i32),
}

/// Coarse classification of [`Error`], convenient for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::InvalidInput`]
    InvalidInput,
    /// See [`Error::Compile`]
    CompileError,
    /// See [`Error::RuntimeStart`]
    RuntimeStart,
    /// See [`Error::Timeout`]
    Timeout,
    /// See [`Error::NonZeroExit`]
    NonZeroExit,
}

impl Error {
    /// Kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Compile { .. } => ErrorKind::CompileError,
            Self::RuntimeStart(_) => ErrorKind::RuntimeStart,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::NonZeroExit(_) => ErrorKind::NonZeroExit,
        }
    }

    /// Whether the error aborted the run before the program finished.
    ///
    /// A non-zero exit is reported but the program still ran to completion.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NonZeroExit(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            Error::InvalidInput("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            Error::Compile {
                diagnostics: "boom".into()
            }
            .kind(),
            ErrorKind::CompileError
        );
        assert_eq!(
            Error::Timeout(Duration::from_secs(3)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(Error::NonZeroExit(2).kind(), ErrorKind::NonZeroExit);
    }

    #[test]
    fn test_non_zero_exit_is_not_fatal() {
        assert!(!Error::NonZeroExit(1).is_fatal());
        assert!(Error::RuntimeStart("no pty".into()).is_fatal());
        assert!(Error::Timeout(Duration::from_secs(1)).is_fatal());
    }

    #[test]
    fn test_timeout_message() {
        let msg = Error::Timeout(Duration::from_secs(30)).to_string();
        assert_eq!(msg, "execution timed out after 30s");
    }
}
