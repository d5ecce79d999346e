//! Output fan-out: console mirror, capture buffer and optional log file

use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, Stdout};
use tracing::{debug, warn};

/// Destination for bytes read from the pty.
///
/// The capture buffer always receives every byte. Console and log-file
/// writes are best-effort: the first failure disables that target and is
/// logged once.
pub struct OutputSink {
    buffer: Vec<u8>,
    console: Option<Stdout>,
    log: Option<File>,
}

impl OutputSink {
    /// Sink that only captures.
    #[must_use]
    pub fn capture_only() -> Self {
        Self {
            buffer: Vec::new(),
            console: None,
            log: None,
        }
    }

    /// Also mirror to stdout.
    #[must_use]
    pub fn with_console(mut self) -> Self {
        self.console = Some(tokio::io::stdout());
        self
    }

    /// Also append to a freshly created log file at `path`.
    pub async fn with_log_file(mut self, path: &Path) -> std::io::Result<Self> {
        self.log = Some(File::create(path).await?);
        Ok(self)
    }

    /// Whether a log file is attached.
    #[cfg(test)]
    pub fn has_log(&self) -> bool {
        self.log.is_some()
    }

    /// Record one chunk of program output.
    pub async fn write(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        if let Some(console) = self.console.as_mut() {
            let res = async {
                console.write_all(chunk).await?;
                console.flush().await
            }
            .await;
            if let Err(e) = res {
                debug!("Console mirror disabled: {}", e);
                self.console = None;
            }
        }

        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.write_all(chunk).await {
                warn!("Failed to write log file: {}", e);
                self.log = None;
            }
        }
    }

    /// Flush and close the log file, returning the captured bytes.
    pub async fn finish(mut self) -> Vec<u8> {
        if let Some(mut log) = self.log.take() {
            if let Err(e) = log.flush().await {
                warn!("Failed to flush log file: {}", e);
            }
        }
        if let Some(mut console) = self.console.take() {
            let _ = console.flush().await;
        }
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_capture_preserves_order() {
        let mut sink = OutputSink::capture_only();
        sink.write(b"Enter a number: ").await;
        sink.write(b"42\r\n").await;
        sink.write(b"You entered: 42\r\n").await;

        let captured = sink.finish().await;
        assert_eq!(captured, b"Enter a number: 42\r\nYou entered: 42\r\n");
    }

    #[tokio::test]
    async fn test_log_file_mirrors_capture() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prog_output.log");

        let mut sink = OutputSink::capture_only()
            .with_log_file(&path)
            .await
            .unwrap();
        assert!(sink.has_log());
        sink.write(b"line one\r\n").await;
        sink.write(b"line two\r\n").await;
        let captured = sink.finish().await;

        let logged = std::fs::read(&path).unwrap();
        assert_eq!(logged, captured);
    }
}
