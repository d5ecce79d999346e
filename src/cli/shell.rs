//! Interactive student shell
//!
//! Logs the student in, lets them pick a lab session and then reads
//! commands until `exit`, `quit` or end of input. Command failures are
//! reported and the loop continues.

use super::context::StudentContext;
use super::display::{self, failure, success};
use super::picker::{InquirePicker, Picker};
use super::run::LocalRunner;
use super::submit::submit_solution;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use biskut_client::{Error as ApiError, GradingApi};
use crossterm::style::Stylize;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const NO_STUDENT: &str = "Student ID is not set. Use 'set studentid <ID>' first.";

/// `biskut shell`: interactive session on the process's stdin/stdout.
pub async fn run(config: &AppConfig, api: &dyn GradingApi) -> Result<()> {
    let mut picker = InquirePicker;
    let runner = LocalRunner::new(config.runner.to_harness_config());
    let input = tokio::io::BufReader::new(tokio::io::stdin());

    let mut shell = Shell::new(api, &mut picker, runner, input, std::io::stdout());
    shell.run().await
}

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Fetch(Option<String>),
    Show,
    Sessions,
    SetStudentId(String),
    Status,
    Submit { file: PathBuf, question_id: String },
    Run(PathBuf),
    Exit,
    Empty,
    Unknown(String),
}

impl ShellCommand {
    /// Parse a line. `Err` carries the usage message for a known command
    /// given the wrong arguments.
    pub fn parse(line: &str) -> std::result::Result<Self, &'static str> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(Self::Empty);
        };
        let args: Vec<&str> = parts.collect();

        match (command, args.as_slice()) {
            ("help", _) => Ok(Self::Help),
            ("fetch", []) => Ok(Self::Fetch(None)),
            ("fetch", [id, ..]) => Ok(Self::Fetch(Some(id.to_string()))),
            ("show", _) => Ok(Self::Show),
            ("sessions", _) => Ok(Self::Sessions),
            ("set", ["studentid", id]) => Ok(Self::SetStudentId(id.to_string())),
            ("set", _) => Err("Invalid 'set' command. Use 'set studentid <ID>'"),
            ("status", _) => Ok(Self::Status),
            ("submit", [file, question_id]) => Ok(Self::Submit {
                file: PathBuf::from(*file),
                question_id: question_id.to_string(),
            }),
            ("submit", _) => Err("Usage: submit <file_path> <question_id>"),
            ("run", [file]) => Ok(Self::Run(PathBuf::from(*file))),
            ("run", _) => Err("Usage: run <file_path>"),
            ("exit" | "quit", _) => Ok(Self::Exit),
            (other, _) => Ok(Self::Unknown(other.to_string())),
        }
    }
}

/// The interactive shell, generic over where lines come from and where
/// text goes.
pub struct Shell<'a, R, W> {
    api: &'a dyn GradingApi,
    picker: &'a mut dyn Picker,
    runner: LocalRunner,
    input: R,
    out: W,
    ctx: StudentContext,
}

impl<'a, R, W> Shell<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        api: &'a dyn GradingApi,
        picker: &'a mut dyn Picker,
        runner: LocalRunner,
        input: R,
        out: W,
    ) -> Self {
        Self {
            api,
            picker,
            runner,
            input,
            out,
            ctx: StudentContext::default(),
        }
    }

    pub fn context(&self) -> &StudentContext {
        &self.ctx
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until the student quits or input ends.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.out, "Welcome to the Biskut CLI!")?;
        if !self.login().await? {
            return Ok(());
        }

        if let Err(e) = self.choose_lab_session().await {
            failure(&mut self.out, format!("{:#}", e))?;
        }
        writeln!(self.out, "Type 'help' for a list of commands.")?;

        loop {
            write!(self.out, "{}", format!("{}> ", self.ctx.display_name()).bold())?;
            self.out.flush()?;

            let Some(line) = self.read_line().await? else {
                writeln!(self.out)?;
                break;
            };

            match ShellCommand::parse(&line) {
                Ok(ShellCommand::Exit) => break,
                Ok(command) => {
                    debug!(?command, "Shell command");
                    if let Err(e) = self.execute(command).await {
                        failure(&mut self.out, format!("{:#}", e))?;
                    }
                }
                Err(usage) => failure(&mut self.out, usage)?,
            }
        }

        writeln!(self.out, "Goodbye!")?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .await
            .context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt until a student id checks out. `false` on end of input.
    async fn login(&mut self) -> Result<bool> {
        loop {
            write!(self.out, "Enter StudentID : ")?;
            self.out.flush()?;

            let Some(student_id) = self.read_line().await? else {
                writeln!(self.out)?;
                return Ok(false);
            };
            if student_id.is_empty() {
                failure(&mut self.out, "Student ID can't be empty.")?;
                continue;
            }

            match self.api.student(&student_id).await {
                Ok(student) => {
                    success(&mut self.out, format!("Welcome, {}", student.name))?;
                    self.ctx.login(student);
                    return Ok(true);
                }
                Err(ApiError::InvalidStudent(_)) => {
                    failure(&mut self.out, "Bad request. Student ID is not valid.")?
                }
                Err(ApiError::StudentNotFound(_)) => failure(&mut self.out, "Student not found.")?,
                Err(e) => failure(&mut self.out, format!("Error sending request: {}", e))?,
            }
        }
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Help => display::print_help(&mut self.out)?,
            ShellCommand::Fetch(student_id) => {
                if let Some(id) = student_id {
                    self.ctx.student_id = id;
                }
                self.fetch_questions().await?;
            }
            ShellCommand::Show => self.show_questions()?,
            ShellCommand::Sessions => self.choose_lab_session().await?,
            ShellCommand::SetStudentId(id) => {
                success(&mut self.out, format!("Student ID set to: {}", id))?;
                self.ctx.student_id = id;
            }
            ShellCommand::Status => self.show_status().await?,
            ShellCommand::Submit { file, question_id } => {
                self.submit(&file, &question_id).await?;
            }
            ShellCommand::Run(file) => {
                let result = self.runner.run(&file).await;
                if !result.captured_output.is_empty() && !result.captured_output.ends_with(b"\n")
                {
                    writeln!(self.out)?;
                }
                display::print_run_summary(&mut self.out, &result)?;
            }
            ShellCommand::Empty | ShellCommand::Exit => {}
            ShellCommand::Unknown(_) => failure(
                &mut self.out,
                "Unknown command. Type 'help' for a list of commands.",
            )?,
        }
        Ok(())
    }

    async fn choose_lab_session(&mut self) -> Result<()> {
        if !self.ctx.has_student() {
            failure(&mut self.out, NO_STUDENT)?;
            return Ok(());
        }

        self.ctx.lab_sessions = self
            .api
            .lab_sessions(&self.ctx.student_id)
            .await
            .context("Error fetching lab sessions")?;
        success(&mut self.out, "Lab sessions fetched successfully!")?;

        if self.ctx.lab_sessions.is_empty() {
            writeln!(
                self.out,
                "No lab sessions available for you. Contact your instructor to get lab sessions."
            )?;
            return Ok(());
        }

        writeln!(self.out, "{}", "Available lab sessions:".bold())?;
        let Some(index) = self.picker.pick_session(&self.ctx.lab_sessions)? else {
            return Ok(());
        };
        if let Some(session) = self.ctx.select_session(index) {
            display::print_session(&mut self.out, session)?;
            writeln!(
                self.out,
                "You selected lab session: {} (ID: {})",
                session.program.name, session.id
            )?;
        }
        Ok(())
    }

    async fn fetch_questions(&mut self) -> Result<()> {
        if !self.ctx.has_student() {
            failure(&mut self.out, NO_STUDENT)?;
            return Ok(());
        }

        self.ctx.questions = self
            .api
            .questions(&self.ctx.student_id)
            .await
            .context("Error fetching questions")?;
        success(&mut self.out, "Questions fetched successfully!")?;
        self.show_questions()
    }

    fn show_questions(&mut self) -> Result<()> {
        if self.ctx.questions.is_empty() {
            writeln!(self.out, "No questions available. Use 'fetch' to get questions.")?;
            return Ok(());
        }

        writeln!(self.out, "{}", "Available questions:".bold())?;
        if let Some(question) = self
            .picker
            .pick_question(&self.ctx.questions)?
            .and_then(|i| self.ctx.questions.get(i))
        {
            writeln!(
                self.out,
                "You selected question: {} (ID: {})",
                question.description, question.id
            )?;
            display::print_question(&mut self.out, question)?;
        }
        Ok(())
    }

    async fn show_status(&mut self) -> Result<()> {
        if !self.ctx.has_student() {
            failure(&mut self.out, NO_STUDENT)?;
            return Ok(());
        }
        let Some(lab_session_id) = self.ctx.status_session_id() else {
            failure(
                &mut self.out,
                "No questions fetched. Use 'fetch' to get questions first.",
            )?;
            return Ok(());
        };

        let status = self
            .api
            .status(&self.ctx.student_id, &lab_session_id)
            .await
            .context("Error fetching status")?;
        display::print_status(&mut self.out, &status)?;
        Ok(())
    }

    async fn submit(&mut self, file: &std::path::Path, question_id: &str) -> Result<()> {
        if !self.ctx.has_student() {
            failure(&mut self.out, NO_STUDENT)?;
            return Ok(());
        }
        let question = self
            .ctx
            .question(question_id)
            .with_context(|| {
                format!(
                    "Error getting question details: question {} is not loaded",
                    question_id
                )
            })?
            .clone();

        submit_solution(
            self.api,
            &self.runner,
            &self.ctx.student_id,
            &question,
            file,
            &mut self.out,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::{FakeApi, ScriptedPicker};
    use biskut_runner::{HarnessConfig, InputSource};
    use tempfile::TempDir;

    fn runner(dir: &TempDir) -> LocalRunner {
        let config = HarnessConfig::headless()
            .with_work_dir(dir.path())
            .with_compiler("/nonexistent/biskut-cc", Vec::new());
        LocalRunner::new(config).with_input(InputSource::Closed)
    }

    async fn session(
        api: &FakeApi,
        picker: &mut ScriptedPicker,
        dir: &TempDir,
        script: &str,
    ) -> (String, StudentContext) {
        let mut shell = Shell::new(api, picker, runner(dir), script.as_bytes(), Vec::new());
        shell.run().await.unwrap();
        let ctx = shell.context().clone();
        (String::from_utf8(shell.into_output()).unwrap(), ctx)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("   "), Ok(ShellCommand::Empty));
        assert_eq!(ShellCommand::parse("fetch"), Ok(ShellCommand::Fetch(None)));
        assert_eq!(
            ShellCommand::parse("fetch 200"),
            Ok(ShellCommand::Fetch(Some("200".into())))
        );
        assert_eq!(
            ShellCommand::parse("set studentid 42"),
            Ok(ShellCommand::SetStudentId("42".into()))
        );
        assert!(ShellCommand::parse("set student 42").is_err());
        assert_eq!(
            ShellCommand::parse("submit a.cpp 11"),
            Ok(ShellCommand::Submit {
                file: PathBuf::from("a.cpp"),
                question_id: "11".into()
            })
        );
        assert_eq!(
            ShellCommand::parse("submit a.cpp"),
            Err("Usage: submit <file_path> <question_id>")
        );
        assert_eq!(ShellCommand::parse("run"), Err("Usage: run <file_path>"));
        assert_eq!(ShellCommand::parse("quit"), Ok(ShellCommand::Exit));
        assert_eq!(
            ShellCommand::parse("dance"),
            Ok(ShellCommand::Unknown("dance".into()))
        );
    }

    #[tokio::test]
    async fn test_login_retries_until_valid() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        let mut picker = ScriptedPicker::new([Some(0)]);

        let (out, ctx) = session(&api, &mut picker, &dir, "\nabc\n999\ndown\n131\nexit\n").await;

        assert!(out.contains("Student ID can't be empty."));
        assert!(out.contains("Bad request. Student ID is not valid."));
        assert!(out.contains("Student not found."));
        assert!(out.contains("Error sending request"));
        assert!(out.contains("Welcome, Asha"));
        assert!(out.contains("You selected lab session: BTech CSE (ID: 7)"));
        assert!(out.trim_end().ends_with("Goodbye!"));
        assert_eq!(ctx.lab_session_id.as_deref(), Some("7"));
        assert_eq!(ctx.questions.len(), 3);
    }

    #[tokio::test]
    async fn test_end_of_input_during_login() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        let mut picker = ScriptedPicker::default();

        let (out, ctx) = session(&api, &mut picker, &dir, "999\n").await;

        assert!(out.contains("Student not found."));
        assert!(ctx.student.is_none());
        assert!(picker.asked.is_empty());
    }

    #[tokio::test]
    async fn test_status_uses_selected_session() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        let mut picker = ScriptedPicker::new([Some(0)]);

        let (out, _) = session(&api, &mut picker, &dir, "131\nstatus\nquit\n").await;

        assert_eq!(api.status_requests(), vec![("131".into(), "7".into())]);
        assert!(out.contains("Question 12: failed"));
        assert!(out.contains("Question 21: Not Attempted"));
    }

    #[tokio::test]
    async fn test_fetch_with_id_and_show() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        // skip session pick, then pick the second fetched question
        let mut picker = ScriptedPicker::new([None, Some(1)]);

        let (out, ctx) = session(&api, &mut picker, &dir, "131\nfetch 200\nexit\n").await;

        assert_eq!(api.question_requests(), vec!["200".to_string()]);
        assert_eq!(ctx.student_id, "200");
        assert!(out.contains("Questions fetched successfully!"));
        assert!(out.contains("You selected question: Question 12 (ID: 12)"));
        assert_eq!(picker.asked, vec!["session", "question"]);
    }

    #[tokio::test]
    async fn test_bad_commands_keep_the_loop_alive() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        let mut picker = ScriptedPicker::new([None]);

        let (out, ctx) = session(
            &api,
            &mut picker,
            &dir,
            "131\ndance\nset student 5\nsubmit only-one-arg\nset studentid 77\nhelp\n",
        )
        .await;

        assert!(out.contains("Unknown command. Type 'help' for a list of commands."));
        assert!(out.contains("Invalid 'set' command. Use 'set studentid <ID>'"));
        assert!(out.contains("Usage: submit <file_path> <question_id>"));
        assert!(out.contains("Student ID set to: 77"));
        assert!(out.contains("Available commands:"));
        assert!(out.trim_end().ends_with("Goodbye!"));
        assert_eq!(ctx.student_id, "77");
    }

    #[tokio::test]
    async fn test_submit_from_shell() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("sum.cpp");
        std::fs::write(&source, "int main() { return 0; }\n").unwrap();
        let api = FakeApi::new();
        let mut picker = ScriptedPicker::new([Some(0)]);

        let script = format!(
            "131\nsubmit {0} 99\nsubmit {0} 21\nsubmit {0} 12\nquit\n",
            source.display()
        );
        let (out, _) = session(&api, &mut picker, &dir, &script).await;

        assert!(out.contains("question 99 is not loaded"));
        assert!(out.contains("Execution completed:"));
        assert!(out.contains("Submission aborted."));

        let sent = api.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].question_id, "21");
        assert_eq!(sent[0].student_id, "131");
    }
}
