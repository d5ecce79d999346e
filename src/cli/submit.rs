//! Solution submission
//!
//! Test-case-graded questions upload the source and stream grading
//! progress. Output-graded questions run the program locally first and
//! upload what it printed alongside the source.

use super::display;
use super::run::LocalRunner;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use biskut_client::{EventKind, GradingApi, GradingEvent, Question, Submission};
use biskut_runner::ErrorKind;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// `biskut submit <file> --question ID --student ID`
pub async fn run(
    config: &AppConfig,
    api: &dyn GradingApi,
    file: &Path,
    question_id: &str,
    student_id: &str,
) -> Result<()> {
    let student = api
        .student(student_id.trim())
        .await
        .context("Error verifying student")?;
    let student_id = student.id.to_string();
    let question = find_question(api, &student_id, question_id).await?;

    let runner = LocalRunner::new(config.runner.to_harness_config());
    let mut stdout = std::io::stdout();
    match submit_solution(api, &runner, &student_id, &question, file, &mut stdout).await? {
        SubmitOutcome::Aborted => anyhow::bail!("Submission aborted"),
        _ => Ok(()),
    }
}

/// Look a question up among today's questions, then among all lab sessions.
pub async fn find_question(
    api: &dyn GradingApi,
    student_id: &str,
    question_id: &str,
) -> Result<Question> {
    let question_id = question_id.trim();
    let wanted = |q: &Question| q.id.to_string() == question_id;

    let questions = api
        .questions(student_id)
        .await
        .context("Error fetching questions")?;
    if let Some(question) = questions.into_iter().find(|q| wanted(q)) {
        return Ok(question);
    }

    let sessions = api
        .lab_sessions(student_id)
        .await
        .context("Error fetching lab sessions")?;
    sessions
        .into_iter()
        .flat_map(|s| s.questions)
        .find(|q| wanted(q))
        .with_context(|| format!("Question {} not found", question_id))
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Graded by the server; carries the final event when one arrived
    Graded(Option<GradingEvent>),
    /// Uploaded with the locally captured output
    Submitted,
    /// The local run failed; nothing was sent
    Aborted,
}

pub async fn submit_solution(
    api: &dyn GradingApi,
    runner: &LocalRunner,
    student_id: &str,
    question: &Question,
    file: &Path,
    out: &mut impl Write,
) -> Result<SubmitOutcome> {
    tokio::fs::metadata(file)
        .await
        .with_context(|| format!("Error opening file {}", file.display()))?;

    let mut submission = Submission::new(student_id, question.id.to_string(), file);

    if !question.test_case_based {
        writeln!(out, "Running your program. Its output will be submitted.")?;
        out.flush()?;

        let result = runner.run(file).await;
        match result.error_kind() {
            None => {}
            Some(ErrorKind::NonZeroExit) => {
                let summary = result.summary().unwrap_or_default();
                display::failure(out, format!("{}; submitting its output anyway", summary))?;
            }
            Some(_) => {
                display::print_run_summary(out, &result)?;
                display::failure(out, "Submission aborted.")?;
                return Ok(SubmitOutcome::Aborted);
            }
        }
        submission = submission.with_user_output(result.output_text());
    }

    let mut stream = api
        .submit(&submission)
        .await
        .context("Error sending submission")?;
    info!(question_id = question.id, "Submission accepted");

    if !question.test_case_based {
        display::success(out, "\nSubmitted successfully.")?;
        return Ok(SubmitOutcome::Submitted);
    }

    writeln!(out, "Submission sent. Waiting for response...")?;
    out.flush()?;

    let mut last = None;
    while let Some(event) = stream
        .next_event()
        .await
        .context("Error reading response")?
    {
        display::print_event(out, &event)?;
        out.flush()?;
        if event.end || event.kind == EventKind::Completed {
            last = Some(event);
        }
    }
    Ok(SubmitOutcome::Graded(last))
}
