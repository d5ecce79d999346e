//! Harness configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default wall-clock limit for one run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default limit for the compiler invocation.
pub const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 60;
/// How long the output pump may keep draining after the child is gone.
pub const DEFAULT_DRAIN_GRACE_MS: u64 = 500;
/// Recognized source extension (without the dot).
pub const DEFAULT_SOURCE_EXTENSION: &str = "cpp";
/// Default C++ compiler.
pub const DEFAULT_COMPILER: &str = "g++";

/// Configuration for [`crate::Harness`].
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Compiler executable.
    pub compiler: String,
    /// Extra arguments placed before the source path.
    pub compiler_args: Vec<String>,
    /// Recognized source extension, without the leading dot.
    pub source_extension: String,
    /// Maximum wall-clock duration of the run.
    pub timeout: Duration,
    /// Maximum duration of the compiler invocation.
    pub compile_timeout: Duration,
    /// Grace period for draining output after exit or kill.
    pub drain_grace: Duration,
    /// Directory receiving the binary and log file. `None` = current dir.
    pub work_dir: Option<PathBuf>,
    /// Mirror program output to stdout while capturing it.
    pub mirror_console: bool,
    /// Persist output to `<binary>_output.log`.
    pub write_log: bool,
    /// Put the caller's terminal into raw mode during the run.
    pub raw_mode: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_string(),
            compiler_args: Vec::new(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            compile_timeout: Duration::from_secs(DEFAULT_COMPILE_TIMEOUT_SECS),
            drain_grace: Duration::from_millis(DEFAULT_DRAIN_GRACE_MS),
            work_dir: None,
            mirror_console: true,
            write_log: false,
            raw_mode: true,
        }
    }
}

impl HarnessConfig {
    /// Configuration without console side effects: no mirroring, no raw
    /// mode. Used by non-interactive callers and tests.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            mirror_console: false,
            raw_mode: false,
            ..Self::default()
        }
    }

    /// Set the run timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the compiler and its extra arguments
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl Into<String>, args: Vec<String>) -> Self {
        self.compiler = compiler.into();
        self.compiler_args = args;
        self
    }

    /// Set the work directory
    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Enable or disable the output log file
    #[must_use]
    pub fn with_log_file(mut self, enabled: bool) -> Self {
        self.write_log = enabled;
        self
    }

    /// Set the drain grace period
    #[must_use]
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Resolved work directory.
    #[must_use]
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.compiler, "g++");
        assert_eq!(config.source_extension, "cpp");
        assert!(config.mirror_console);
        assert!(!config.write_log);
        assert_eq!(config.work_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_headless_keeps_timeout() {
        let config = HarnessConfig::headless().with_timeout(Duration::from_secs(2));
        assert!(!config.mirror_console);
        assert!(!config.raw_mode);
        assert_eq!(config.timeout, Duration::from_secs(2));
    }
}
