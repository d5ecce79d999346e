//! Error types for biskut-client

use thiserror::Error;

/// Grading API error type
#[derive(Debug, Error)]
pub enum Error {
    /// Could not reach the server or read its response
    #[error("network error: {0}")]
    Network(String),

    /// Server rejected the student id (HTTP 400)
    #[error("bad request: student id {0} is not valid")]
    InvalidStudent(String),

    /// No student with that id (HTTP 404)
    #[error("student not found: {0}")]
    StudentNotFound(String),

    /// Any other non-success status
    #[error("api error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Local file could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
