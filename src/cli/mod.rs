//! CLI module for Biskut
//!
//! Provides commands:
//! - `shell`: interactive session (default)
//! - `submit`: one-shot solution submission
//! - `run`: compile and run a solution locally

use crate::config::{load_config, AppConfig};
use anyhow::Context;
use biskut_client::GradingClient;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod context;
pub mod display;
pub mod picker;
pub mod run;
pub mod shell;
pub mod submit;

#[cfg(test)]
pub mod testing;

/// Biskut lab client
#[derive(Parser, Debug)]
#[command(name = "biskut")]
#[command(about = "Student client for the Biskut lab grading service")]
#[command(version)]
pub struct Cli {
    /// Grading server URL (overrides configuration)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive session (default)
    Shell,
    /// Submit a solution file
    Submit {
        /// C++ source file
        file: PathBuf,
        /// Question id
        #[arg(long, short)]
        question: String,
        /// Student id
        #[arg(long, short)]
        student: String,
    },
    /// Compile and run a solution locally
    Run {
        /// C++ source file
        file: PathBuf,
        /// Kill the program after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => shell::run(&config, &grading_client(&config)?).await,
        Commands::Submit {
            file,
            question,
            student,
        } => submit::run(&config, &grading_client(&config)?, &file, &question, &student).await,
        Commands::Run { file, timeout } => run::run(&config, &file, timeout).await,
    }
}

fn grading_client(config: &AppConfig) -> anyhow::Result<GradingClient> {
    GradingClient::new(config.api.to_client_config()).context("Failed to create grading client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_one_shot_commands() {
        let cli = Cli::try_parse_from([
            "biskut", "submit", "sum.cpp", "--question", "11", "--student", "131",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Submit {
                file,
                question,
                student,
            }) => {
                assert_eq!(file, PathBuf::from("sum.cpp"));
                assert_eq!(question, "11");
                assert_eq!(student, "131");
            }
            other => panic!("unexpected {:?}", other),
        }

        let cli = Cli::try_parse_from(["biskut", "run", "a.cpp", "--timeout", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Run { timeout: Some(5), .. })
        ));
    }

    #[test]
    fn test_submit_requires_question() {
        assert!(Cli::try_parse_from(["biskut", "submit", "sum.cpp", "--student", "1"]).is_err());
    }
}
