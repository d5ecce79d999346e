//! Biskut grading API client
//!
//! Typed access to the lab grading server: student lookup, lab sessions,
//! questions, per-question status, and solution submission with a stream
//! of grading progress events.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod events;
pub mod types;

pub use client::{GradingApi, GradingClient, GradingClientConfig, Submission, SubmissionStream};
pub use error::{Error, Result};
pub use events::{EventKind, GradingEvent, SseDecoder};
pub use types::{Instructor, LabSession, Program, Question, QuestionState, Status, Student};
