//! Configuration loading
//!
//! Embedded defaults, then the user config file, then `./biskut.toml`,
//! then `BISKUT_*` environment variables.

use anyhow::{Context, Result};
use biskut_client::GradingClientConfig;
use biskut_runner::HarnessConfig;
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Project-local override file
const LOCAL_CONFIG: &str = "biskut.toml";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Grading server
    pub api: ApiConfig,
    /// Local compile-and-run harness
    pub runner: RunnerSettings,
}

/// Grading server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    /// Client configuration for these settings
    pub fn to_client_config(&self) -> GradingClientConfig {
        GradingClientConfig::default()
            .with_base_url(&self.base_url)
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}

/// Harness settings
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSettings {
    pub compiler: String,
    #[serde(default)]
    pub compiler_args: Vec<String>,
    pub source_extension: String,
    pub timeout_secs: u64,
    pub drain_grace_ms: u64,
    pub raw_mode: bool,
}

impl RunnerSettings {
    /// Interactive harness configuration for these settings
    pub fn to_harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            source_extension: self.source_extension.clone(),
            raw_mode: self.raw_mode,
            ..HarnessConfig::default()
        }
        .with_compiler(&self.compiler, self.compiler_args.clone())
        .with_timeout(Duration::from_secs(self.timeout_secs))
        .with_drain_grace(Duration::from_millis(self.drain_grace_ms))
    }
}

/// User-level config file (`~/.config/biskut/config.toml` on Linux)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("biskut").join("config.toml"))
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let mut files: Vec<PathBuf> = user_config_path().into_iter().collect();
    files.push(PathBuf::from(LOCAL_CONFIG));
    load_layers(&files, true)
}

fn load_layers(files: &[PathBuf], with_env: bool) -> Result<AppConfig> {
    let mut builder =
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    for path in files {
        builder = builder.add_source(File::from(path.as_path()).required(false));
    }

    if with_env {
        // BISKUT_RUNNER__TIMEOUT_SECS=5
        builder = builder.add_source(
            Environment::with_prefix("BISKUT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
    }

    builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_defaults() {
        let config = load_layers(&[], false).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.runner.compiler, "g++");
        assert_eq!(config.runner.timeout_secs, 30);
        assert!(config.runner.compiler_args.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("biskut.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"http://grader:8080\"\n\n[runner]\ntimeout_secs = 5\ncompiler_args = [\"-std=c++17\"]\n",
        )
        .unwrap();

        let config = load_layers(&[path, dir.path().join("missing.toml")], false).unwrap();
        assert_eq!(config.api.base_url, "http://grader:8080");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.runner.timeout_secs, 5);
        assert_eq!(config.runner.compiler_args, vec!["-std=c++17"]);
    }

    #[test]
    fn test_harness_bridge() {
        let settings = load_layers(&[], false).unwrap().runner;
        let harness = settings.to_harness_config();
        assert_eq!(harness.timeout, Duration::from_secs(30));
        assert_eq!(harness.drain_grace, Duration::from_millis(500));
        assert_eq!(harness.source_extension, "cpp");
        assert!(harness.mirror_console);
        assert!(!harness.write_log);
    }
}
