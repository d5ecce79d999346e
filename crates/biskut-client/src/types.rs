//! Grading API data types

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Database id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email
    #[serde(default)]
    pub email: String,
    /// Enrollment number
    #[serde(default)]
    pub enrollment_number: String,
    /// Department id
    #[serde(default)]
    pub department_id: i64,
}

/// A question belonging to a lab session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question id
    pub id: i64,
    /// Authoring instructor
    #[serde(default)]
    pub instructor_id: i64,
    /// Owning lab session
    #[serde(default)]
    pub lab_session_id: i64,
    /// Problem statement
    #[serde(default)]
    pub description: String,
    /// Serialized test cases (JSON text, owned by the server)
    #[serde(default)]
    pub inputs_outputs: String,
    /// Graded by server-side test cases rather than submitted output
    #[serde(default)]
    pub test_case_based: bool,
}

/// Academic program a lab session belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Program {
    /// Program id
    pub id: i64,
    /// Program name
    pub name: String,
    /// Description
    pub description: String,
    /// Short code
    pub program_code: String,
    /// Department id
    pub department_id: i64,
    /// Creation timestamp
    pub created_at: String,
}

/// Instructor running a lab session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instructor {
    /// Instructor id
    pub id: i64,
    /// Name
    pub name: String,
    /// Email
    pub email: String,
    /// Department id
    pub department_id: i64,
}

/// A lab session with its program, instructor and questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabSession {
    /// Session id
    pub id: i64,
    /// Program id
    #[serde(default)]
    pub program_id: i64,
    /// Instructor id
    #[serde(default)]
    pub instructor_id: i64,
    /// Session date as sent by the server
    #[serde(default)]
    pub session_date: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Program
    #[serde(default)]
    pub program: Program,
    /// Instructor
    #[serde(default)]
    pub instructor: Instructor,
    /// Questions of the session
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Per-question status of one student in one lab session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Student id
    #[serde(deserialize_with = "string_or_number")]
    pub student_id: String,
    /// Lab session id
    #[serde(deserialize_with = "string_or_number")]
    pub lab_session_id: String,
    /// Question id → status text
    #[serde(default)]
    pub status: BTreeMap<String, String>,
}

/// Classified question status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionState {
    /// Submission failed grading
    Failed,
    /// No submission yet
    NotAttempted,
    /// Anything else the server reports (e.g. `success`)
    Other,
}

impl QuestionState {
    /// Classify a raw status string.
    pub fn from_status(status: &str) -> Self {
        match status {
            "failed" => Self::Failed,
            "Not Attempted" => Self::NotAttempted,
            _ => Self::Other,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
