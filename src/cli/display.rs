//! Terminal presentation

use biskut_client::{EventKind, GradingEvent, LabSession, Question, QuestionState, Status};
use biskut_runner::{ErrorKind, ExecutionResult};
use chrono::{DateTime, NaiveDate};
use crossterm::style::Stylize;
use serde_json::Value;
use std::io::{self, Write};

/// Shell command reference
pub const HELP: &[(&str, &str)] = &[
    ("help", "Show this help message"),
    ("fetch [studentID]", "Fetch today's questions for the given student ID"),
    ("show", "Display fetched questions"),
    ("sessions", "Choose another lab session"),
    ("set studentid <ID>", "Set the student ID"),
    ("status", "Fetch and display question status"),
    ("submit <file> <qID>", "Submit a solution file for a specific question"),
    ("run <file>", "Compile and run a solution locally"),
    ("exit, quit", "Exit the CLI"),
];

pub fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Available commands:")?;
    for (usage, about) in HELP {
        writeln!(out, "  {:<20}- {}", usage, about)?;
    }
    Ok(())
}

pub fn success(out: &mut impl Write, message: impl AsRef<str>) -> io::Result<()> {
    writeln!(out, "{}", message.as_ref().green())
}

pub fn failure(out: &mut impl Write, message: impl AsRef<str>) -> io::Result<()> {
    writeln!(out, "{}", message.as_ref().red())
}

/// Render an API timestamp as a calendar date; unknown formats pass through.
pub fn format_session_date(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.to_string();
    }
    raw.to_string()
}

/// One-line summary of a lab session
pub fn session_label(session: &LabSession) -> String {
    format!(
        "{} ({})",
        session.program.name,
        format_session_date(&session.session_date)
    )
}

pub fn print_session(out: &mut impl Write, session: &LabSession) -> io::Result<()> {
    writeln!(out, "--------- Lab Session ----------")?;
    writeln!(out, "{} {}", "Program:".dim(), session.program.name)?;
    writeln!(
        out,
        "{} {}",
        "Date:".dim(),
        format_session_date(&session.session_date)
    )?;
    writeln!(out, "{} {}", "Instructor:".dim(), session.instructor.name)?;
    writeln!(out, "{} {}", "Description:".dim(), session.description)
}

pub fn print_question(out: &mut impl Write, question: &Question) -> io::Result<()> {
    writeln!(out, "--------- Question Details ----------")?;
    writeln!(out, "{} {}", "ID:".dim(), question.id)?;
    writeln!(out, "{} {}", "Description:".dim(), question.description)?;
    writeln!(out, "{} {}", "Lab Session ID:".dim(), question.lab_session_id)?;
    writeln!(
        out,
        "{} {}",
        "Test Case Based:".dim(),
        question.test_case_based
    )
}

/// Per-question status, coloured by state.
pub fn print_status(out: &mut impl Write, status: &Status) -> io::Result<()> {
    writeln!(out, "{}", "Question Status:".bold())?;
    writeln!(out, "--------------------")?;
    writeln!(out, "Student ID: {}", status.student_id)?;
    writeln!(out, "Lab Session ID: {}", status.lab_session_id)?;
    writeln!(out, "Status:")?;
    for (question_id, state) in &status.status {
        let line = format!("  Question {}: {}", question_id, state);
        match QuestionState::from_status(state) {
            QuestionState::Failed => writeln!(out, "{}", line.red())?,
            QuestionState::NotAttempted => writeln!(out, "{}", line.yellow())?,
            QuestionState::Other => writeln!(out, "{}", line.green())?,
        }
    }
    writeln!(out, "--------------------")
}

/// Progress line(s) for one grading event.
pub fn print_event(out: &mut impl Write, event: &GradingEvent) -> io::Result<()> {
    match event.kind {
        EventKind::Queued => writeln!(out, "Request sent for execution"),
        EventKind::Started => writeln!(out, "Worker has picked up the request"),
        EventKind::Compiled => {
            writeln!(out, "Compilation result:")?;
            let status = event.status().unwrap_or("unknown");
            if status == "failed" {
                writeln!(out, "  {}", status.red())?;
            } else {
                writeln!(out, "  {}", status.green())?;
            }
            if let Some(output) = event.output() {
                writeln!(out, "{}", output)?;
            }
            Ok(())
        }
        EventKind::Completed => {
            writeln!(out, "Execution completed:")?;
            let passed = event.passed().len();
            let failed = event.failed();
            let summary = format!("  Passed: {}, Failed: {}", passed, failed.len());
            if failed.is_empty() {
                write!(out, "{}", summary.green())?;
            } else {
                write!(out, "{}", summary.red())?;
            }
            match event.time_ms() {
                Some(ms) => writeln!(out, " ({} ms)", ms)?,
                None => writeln!(out)?,
            }
            for case in failed {
                writeln!(out, "{}", describe_failed_case(case))?;
            }
            Ok(())
        }
        EventKind::Unknown => writeln!(out, "{}", event.payload),
    }
}

fn describe_failed_case(case: &Value) -> String {
    let field = |key: &str| match case.get(key) {
        Some(Value::String(s)) => s.trim_end().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let mut line = format!(
        "  input: {} | expected: {} | got: {}",
        field("input"),
        field("expected"),
        field("output")
    );
    let reason = field("reason");
    if !reason.is_empty() {
        line.push_str(&format!(" ({})", reason));
    }
    line
}

/// Outcome of a local run
pub fn print_run_summary(out: &mut impl Write, result: &ExecutionResult) -> io::Result<()> {
    match result.summary() {
        None => success(out, "Program finished successfully"),
        Some(summary) => {
            if result.error_kind() == Some(ErrorKind::CompileError) {
                writeln!(out, "{}", result.compiler_output.trim_end())?;
            }
            failure(out, summary)
        }
    }
}
