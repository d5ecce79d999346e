//! Biskut Runner - Interactive compile-and-run harness
//!
//! This crate compiles a C++ solution and runs it attached to a
//! pseudo-terminal so it behaves as if started from an interactive shell:
//! - Harness: compile, run, timeout, cleanup, structured result
//! - Session: pty-attached child with output and input pumps
//! - Terminal: raw-mode guard for the caller's terminal
//! - Input: stdin forwarding, keystroke-to-bytes on a terminal

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod compiler;
pub mod config;
pub mod error;
pub mod harness;
pub mod input;
pub mod job;
pub mod result;
pub mod session;
pub mod sink;
pub mod terminal;

pub use config::HarnessConfig;
pub use error::{Error, ErrorKind, Result};
pub use harness::{Harness, HarnessState};
pub use input::InputSource;
pub use job::CompileJob;
pub use result::ExecutionResult;
