//! biskut-run - compile and run one C++ file interactively
//!
//! Mirrors the program's terminal output live, logs it to
//! `<binary>_output.log` and removes the binary afterwards.

#![forbid(unsafe_code)]

use biskut_runner::{Error, ErrorKind, Harness, HarnessConfig, InputSource};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Compile and run a C++ file on a pseudo-terminal
#[derive(Parser, Debug)]
#[command(name = "biskut-run")]
#[command(version)]
struct Args {
    /// Path to the C++ source file
    source: PathBuf,

    /// Kill the program after this many seconds
    #[arg(long, default_value_t = biskut_runner::config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

const USAGE: &str = "Usage: biskut-run <path_to_cpp_file> [--timeout <SECS>]";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biskut_runner=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            eprintln!("{}", USAGE);
            return ExitCode::from(1);
        }
    };

    let config = HarnessConfig::default()
        .with_timeout(Duration::from_secs(args.timeout))
        .with_log_file(true);
    let result = Harness::with_config(config)
        .compile_and_run(&args.source, InputSource::Terminal)
        .await;

    if !result.captured_output.is_empty() && !result.captured_output.ends_with(b"\n") {
        println!();
    }

    let mut failed = false;
    match &result.error {
        None => {}
        Some(Error::InvalidInput(msg)) => {
            eprintln!("{}", msg);
            eprintln!("{}", USAGE);
            return ExitCode::from(1);
        }
        Some(Error::Compile { diagnostics }) => {
            eprintln!("Compilation error:\n{}", diagnostics.trim_end());
            return ExitCode::from(1);
        }
        Some(e) => {
            if let Some(summary) = result.summary() {
                println!("{}", summary);
            }
            failed = matches!(e.kind(), ErrorKind::Timeout | ErrorKind::RuntimeStart);
        }
    }

    if let Some(path) = &result.log_path {
        println!("Terminal output logged to {}", path.display());
    }

    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
