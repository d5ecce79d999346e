//! External compiler invocation

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::job::CompileJob;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Compile `job`, returning the compiler's combined output on success.
pub async fn compile(config: &HarnessConfig, job: &CompileJob) -> Result<String> {
    let mut cmd = Command::new(&config.compiler);
    cmd.args(&config.compiler_args)
        .arg(job.source_path())
        .arg("-o")
        .arg(job.binary_path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(compiler = %config.compiler, source = %job.source_path().display(), "Compiling");

    let child = cmd.spawn().map_err(|e| Error::Compile {
        diagnostics: format!("failed to run {}: {}", config.compiler, e),
    })?;

    let output = tokio::time::timeout(config.compile_timeout, child.wait_with_output())
        .await
        .map_err(|_| Error::Compile {
            diagnostics: format!(
                "{} did not finish within {}s",
                config.compiler,
                config.compile_timeout.as_secs()
            ),
        })?
        .map_err(|e| Error::Compile {
            diagnostics: format!("failed to wait for {}: {}", config.compiler, e),
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        if combined.trim().is_empty() {
            combined = format!("{} failed with {}", config.compiler, output.status);
        }
        return Err(Error::Compile {
            diagnostics: combined,
        });
    }

    info!(binary = %job.binary_path().display(), "Compilation successful");
    Ok(combined)
}
