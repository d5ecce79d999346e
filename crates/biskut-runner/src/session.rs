//! One execution of a compiled binary attached to a pseudo-terminal

use crate::error::{Error, Result};
use crate::input::{spawn_input_pump, InputSource};
use crate::sink::OutputSink;
use crate::terminal::{self, RawModeGuard};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The child exited by itself.
    Exited(ExitStatus),
    /// The deadline elapsed and the child was killed.
    TimedOut,
    /// The child's status could not be collected; it was killed.
    Lost(String),
}

/// What a finished session hands back.
#[derive(Debug)]
pub struct SessionOutcome {
    /// How the child ended
    pub end: SessionEnd,
    /// Everything read from the pty
    pub captured: Vec<u8>,
}

/// Options for one run.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Wall-clock limit
    pub timeout: Duration,
    /// Output drain grace after exit or kill
    pub drain_grace: Duration,
    /// Put the caller's terminal into raw mode
    pub raw_mode: bool,
}

/// A running child on a pty plus its two I/O pumps.
///
/// Owned by a single harness call. [`RunSession::wait`] consumes it, so a
/// session can be waited on once and is always torn down afterwards.
pub struct RunSession {
    child: Child,
    guard: RawModeGuard,
    cancel: CancellationToken,
    input_cancel: CancellationToken,
    output_pump: JoinHandle<OutputSink>,
    input_pump: JoinHandle<()>,
    deadline: Instant,
    timeout: Duration,
    drain_grace: Duration,
}

impl RunSession {
    /// Spawn `executable` on a fresh pty and start the pumps.
    pub fn start(
        executable: &Path,
        sink: OutputSink,
        input: InputSource,
        options: &SessionOptions,
    ) -> Result<Self> {
        let (pty, pts) =
            pty_process::open().map_err(|e| Error::RuntimeStart(format!("failed to open pty: {}", e)))?;

        let (rows, cols) = terminal::size();
        if let Err(e) = pty.resize(pty_process::Size::new(rows, cols)) {
            debug!("Failed to size pty: {}", e);
        }

        let mut child = pty_process::Command::new(executable)
            .env("TERM", std::env::var("TERM").unwrap_or_else(|_| "xterm-256color".to_string()))
            .spawn(pts)
            .map_err(|e| {
                Error::RuntimeStart(format!("failed to spawn {}: {}", executable.display(), e))
            })?;

        let guard = if options.raw_mode {
            match RawModeGuard::engage() {
                Ok(guard) => guard,
                Err(e) => {
                    let _ = child.start_kill();
                    return Err(Error::RuntimeStart(format!(
                        "failed to set raw terminal mode: {}",
                        e
                    )));
                }
            }
        } else {
            RawModeGuard::inactive()
        };

        info!(
            pid = ?child.id(),
            program = %executable.display(),
            raw_mode = guard.is_active(),
            "Program started"
        );

        let (reader, writer) = pty.into_split();
        let cancel = CancellationToken::new();
        let input_cancel = cancel.child_token();
        let output_pump = spawn_output_pump(reader, sink, cancel.clone());
        let input_pump = spawn_input_pump(input, writer, input_cancel.clone());

        Ok(Self {
            child,
            guard,
            cancel,
            input_cancel,
            output_pump,
            input_pump,
            deadline: Instant::now() + options.timeout,
            timeout: options.timeout,
            drain_grace: options.drain_grace,
        })
    }

    /// Race the child against the deadline, then drain and tear down.
    pub async fn wait(mut self) -> SessionOutcome {
        let end = tokio::select! {
            status = self.child.wait() => match status {
                Ok(status) => SessionEnd::Exited(status),
                Err(e) => {
                    warn!("Failed to wait for program: {}", e);
                    self.kill().await;
                    SessionEnd::Lost(e.to_string())
                }
            },
            _ = tokio::time::sleep_until(self.deadline) => {
                info!(timeout_secs = self.timeout.as_secs(), "Execution timed out; killing program");
                self.kill().await;
                SessionEnd::TimedOut
            }
        };

        // Nothing more can be typed into a finished program.
        self.input_cancel.cancel();

        let sink = match tokio::time::timeout(self.drain_grace, &mut self.output_pump).await {
            Ok(joined) => joined.ok(),
            Err(_) => {
                debug!("Output still open after grace period; cancelling pump");
                self.cancel.cancel();
                (&mut self.output_pump).await.ok()
            }
        };
        self.cancel.cancel();
        let _ = (&mut self.input_pump).await;

        self.guard.restore();

        let captured = match sink {
            Some(sink) => sink.finish().await,
            None => Vec::new(),
        };

        SessionOutcome { end, captured }
    }

    async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!("Failed to kill program: {}", e);
        }
    }
}

/// Exit code of a finished child; signal deaths map to `128 + signal`.
pub fn exit_code(status: &ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

/// Copy pty output into `sink` until end-of-stream or cancellation.
///
/// Linux reports `EIO` on the master once every slave descriptor is closed;
/// that is treated as end-of-stream like any other read error.
pub fn spawn_output_pump<R>(
    mut reader: R,
    mut sink: OutputSink,
    cancel: CancellationToken,
) -> JoinHandle<OutputSink>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        loop {
            tokio::select! {
                biased;
                n = reader.read(&mut buf) => match n {
                    Ok(0) => break,
                    Ok(n) => sink.write(&buf[..n]).await,
                    Err(e) => {
                        debug!("Output pump reached end: {}", e);
                        break;
                    }
                },
                _ = cancel.cancelled() => break,
            }
        }
        sink
    })
}

impl Drop for RunSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        let _ = self.child.start_kill();
    }
}
