//! Compile-and-run harness
//!
//! ```text
//! Idle ─► Compiling ─► CompileFailed ──────────────┐
//!  │          └──────► Compiled ─► Running ─► Exited ┼─► CleanedUp
//!  │                      │          └────► TimedOut ┤
//!  └──────────────────────┴──────────────────────────┘
//! ```
//!
//! Every path ends in `CleanedUp`: the pty is closed, the caller's terminal
//! mode restored and the binary removed before [`Harness::compile_and_run`]
//! returns.

use crate::compiler;
use crate::config::HarnessConfig;
use crate::error::Error;
use crate::input::InputSource;
use crate::job::CompileJob;
use crate::result::ExecutionResult;
use crate::session::{exit_code, RunSession, SessionEnd, SessionOptions};
use crate::sink::OutputSink;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lifecycle of one harness call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    /// Nothing done yet
    Idle,
    /// Compiler running
    Compiling,
    /// Compiler reported failure
    CompileFailed,
    /// Binary produced
    Compiled,
    /// Program attached to a pty
    Running,
    /// Deadline elapsed, program killed
    TimedOut,
    /// Program exited by itself
    Exited,
    /// Artifacts and terminal restored
    CleanedUp,
}

impl HarnessState {
    /// Whether `self → next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use HarnessState::*;
        matches!(
            (self, next),
            (Idle, Compiling)
                | (Idle, CleanedUp)
                | (Compiling, CompileFailed)
                | (Compiling, Compiled)
                | (CompileFailed, CleanedUp)
                | (Compiled, Running)
                | (Compiled, CleanedUp)
                | (Running, TimedOut)
                | (Running, Exited)
                | (TimedOut, CleanedUp)
                | (Exited, CleanedUp)
        )
    }
}

struct StateTracker {
    state: HarnessState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: HarnessState::Idle,
        }
    }

    fn advance(&mut self, next: HarnessState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal harness transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "Harness state");
        self.state = next;
    }
}

/// Compiles a source file and runs it interactively on a pseudo-terminal.
#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    /// Harness with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Harness with custom configuration
    #[must_use]
    pub fn with_config(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Copy of this harness with a different run timeout.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            config: self.config.clone().with_timeout(timeout),
        }
    }

    /// Compile `source`, run it with `input`, and report the outcome.
    ///
    /// Never returns early without cleaning up; failures are reported
    /// through [`ExecutionResult::error`].
    pub async fn compile_and_run(&self, source: &Path, input: InputSource) -> ExecutionResult {
        let started = Instant::now();
        let mut tracker = StateTracker::new();

        let job = match CompileJob::new(
            source,
            &self.config.source_extension,
            &self.config.work_dir(),
        ) {
            Ok(job) => job,
            Err(e) => {
                tracker.advance(HarnessState::CleanedUp);
                return ExecutionResult::failed(e, started.elapsed());
            }
        };

        tracker.advance(HarnessState::Compiling);
        let compiler_output = match compiler::compile(&self.config, &job).await {
            Ok(output) => output,
            Err(e) => {
                tracker.advance(HarnessState::CompileFailed);
                remove_binary(&job);
                tracker.advance(HarnessState::CleanedUp);
                return ExecutionResult::failed(e, started.elapsed());
            }
        };
        tracker.advance(HarnessState::Compiled);

        if self.config.mirror_console {
            if !compiler_output.trim().is_empty() {
                println!("{}", compiler_output.trim_end());
            }
            println!("Compilation successful.");
        }

        let (sink, log_path) = self.build_sink(&job).await;

        let options = SessionOptions {
            timeout: self.config.timeout,
            drain_grace: self.config.drain_grace,
            raw_mode: self.config.raw_mode,
        };
        let session = match RunSession::start(&job.executable(), sink, input, &options) {
            Ok(session) => session,
            Err(e) => {
                remove_binary(&job);
                tracker.advance(HarnessState::CleanedUp);
                let mut result = ExecutionResult::failed(e, started.elapsed());
                result.compiler_output = compiler_output;
                return result;
            }
        };
        tracker.advance(HarnessState::Running);

        let outcome = session.wait().await;
        let (state, exit, error) = classify_end(outcome.end, self.config.timeout);
        tracker.advance(state);

        remove_binary(&job);
        tracker.advance(HarnessState::CleanedUp);

        ExecutionResult {
            captured_output: outcome.captured,
            exit_code: exit,
            error,
            compiler_output,
            log_path,
            elapsed: started.elapsed(),
        }
    }

    async fn build_sink(&self, job: &CompileJob) -> (OutputSink, Option<PathBuf>) {
        let mut sink = OutputSink::capture_only();
        if self.config.mirror_console {
            sink = sink.with_console();
        }
        if !self.config.write_log {
            return (sink, None);
        }

        let path = job.log_path();
        match sink.with_log_file(&path).await {
            Ok(sink) => (sink, Some(path)),
            Err(e) => {
                warn!(path = %path.display(), "Failed to create log file: {}", e);
                let mut sink = OutputSink::capture_only();
                if self.config.mirror_console {
                    sink = sink.with_console();
                }
                (sink, None)
            }
        }
    }
}

/// Harness state, exit code and error for the way a session ended.
fn classify_end(end: SessionEnd, timeout: Duration) -> (HarnessState, Option<i32>, Option<Error>) {
    match end {
        SessionEnd::Exited(status) => {
            let code = exit_code(&status);
            info!(code, "Program exited");
            (
                HarnessState::Exited,
                Some(code),
                (code != 0).then_some(Error::NonZeroExit(code)),
            )
        }
        SessionEnd::TimedOut => (HarnessState::TimedOut, None, Some(Error::Timeout(timeout))),
        SessionEnd::Lost(reason) => (
            HarnessState::Exited,
            None,
            Some(Error::RuntimeStart(format!(
                "lost track of the program: {}",
                reason
            ))),
        ),
    }
}

fn remove_binary(job: &CompileJob) {
    if let Err(e) = job.remove_binary() {
        warn!(path = %job.binary_path().display(), "Failed to remove executable: {}", e);
    }
}
