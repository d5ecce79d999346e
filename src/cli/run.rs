//! Local compile-and-run

use super::display;
use crate::config::AppConfig;
use anyhow::Result;
use biskut_runner::{ExecutionResult, Harness, HarnessConfig, InputSource};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Harness plus the input it feeds to the program.
#[derive(Debug, Clone)]
pub struct LocalRunner {
    harness: Harness,
    input: InputSource,
}

impl LocalRunner {
    /// Runner forwarding the caller's keystrokes
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            harness: Harness::with_config(config),
            input: InputSource::Terminal,
        }
    }

    #[must_use]
    pub fn with_input(mut self, input: InputSource) -> Self {
        self.input = input;
        self
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    pub async fn run(&self, source: &Path) -> ExecutionResult {
        self.harness
            .compile_and_run(source, self.input.clone())
            .await
    }
}

/// `biskut run <file>`: try a solution locally. Fails on anything but a
/// clean zero exit.
pub async fn run(config: &AppConfig, file: &Path, timeout: Option<u64>) -> Result<()> {
    let mut harness_config = config.runner.to_harness_config();
    if let Some(secs) = timeout {
        harness_config = harness_config.with_timeout(Duration::from_secs(secs));
    }

    let result = LocalRunner::new(harness_config).run(file).await;

    let mut stdout = std::io::stdout();
    if !result.captured_output.is_empty() && !result.captured_output.ends_with(b"\n") {
        writeln!(stdout)?;
    }
    display::print_run_summary(&mut stdout, &result)?;

    match result.error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biskut_runner::ErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_runner_rejects_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "hello").unwrap();

        let runner = LocalRunner::new(HarnessConfig::headless().with_work_dir(dir.path()))
            .with_input(InputSource::Closed);
        let result = runner.run(&source).await;

        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput));
        assert!(runner.harness().config().work_dir.is_some());
    }
}
