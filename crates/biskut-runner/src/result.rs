//! Execution result returned to callers

use crate::error::{Error, ErrorKind};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one `compile_and_run` call.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Every byte the program wrote to its terminal.
    pub captured_output: Vec<u8>,
    /// Exit code, present only when the program ran to completion.
    pub exit_code: Option<i32>,
    /// Why the run did not succeed, if it did not.
    pub error: Option<Error>,
    /// Compiler output (warnings on success, diagnostics on failure).
    pub compiler_output: String,
    /// Log file written during the run.
    pub log_path: Option<PathBuf>,
    /// Wall-clock time of the whole call.
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub(crate) fn failed(error: Error, elapsed: Duration) -> Self {
        let compiler_output = match &error {
            Error::Compile { diagnostics } => diagnostics.clone(),
            _ => String::new(),
        };
        Self {
            captured_output: Vec::new(),
            exit_code: None,
            error: Some(error),
            compiler_output,
            log_path: None,
            elapsed,
        }
    }

    /// True when the program compiled, ran and exited with status 0.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.exit_code == Some(0)
    }

    /// Error kind, if any.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(Error::kind)
    }

    /// Captured output decoded as UTF-8 (lossy).
    #[must_use]
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.captured_output).into_owned()
    }

    /// Captured output with the pty's CRLF line endings folded back to LF.
    #[must_use]
    pub fn output_lines(&self) -> String {
        self.output_text().replace("\r\n", "\n")
    }

    /// Human-readable outcome line, `None` on plain success.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        Some(match error {
            Error::Timeout(_) => "Program execution timed out".to_string(),
            Error::NonZeroExit(code) => format!("Program exited with code {}", code),
            Error::Compile { .. } => "Compilation error".to_string(),
            other => other.to_string(),
        })
    }

    /// Convert into a `Result`, keeping the result on non-fatal errors.
    pub fn into_result(mut self) -> Result<Self, Error> {
        match self.error.take() {
            Some(e) if e.is_fatal() => Err(e),
            other => {
                self.error = other;
                Ok(self)
            }
        }
    }
}
