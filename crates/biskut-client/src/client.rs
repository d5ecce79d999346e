//! Grading API client

use crate::error::{Error, Result};
use crate::events::{GradingEvent, SseDecoder};
use crate::types::{LabSession, Question, Status, Student};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Default server address
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const MAX_ERROR_BODY: usize = 512;

/// Client configuration
#[derive(Debug, Clone)]
pub struct GradingClientConfig {
    /// Server base URL, without trailing slash
    pub base_url: String,
    /// Timeout for plain requests. Submission streams are not bounded.
    pub timeout: Duration,
}

impl Default for GradingClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl GradingClientConfig {
    /// Set base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A solution to submit for grading.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Submitting student
    pub student_id: String,
    /// Target question
    pub question_id: String,
    /// Source file sent as the `solution` part
    pub file_path: PathBuf,
    /// Program output captured locally, for output-graded questions
    pub user_output: Option<String>,
}

impl Submission {
    /// Create a submission without captured output
    pub fn new(
        student_id: impl Into<String>,
        question_id: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            question_id: question_id.into(),
            file_path: file_path.into(),
            user_output: None,
        }
    }

    /// Attach captured program output
    pub fn with_user_output(mut self, output: impl Into<String>) -> Self {
        self.user_output = Some(output.into());
        self
    }
}

/// Operations the student CLI needs from the grading server.
#[async_trait]
pub trait GradingApi: Send + Sync {
    /// Look up a student by id
    async fn student(&self, student_id: &str) -> Result<Student>;

    /// Lab sessions available to a student
    async fn lab_sessions(&self, student_id: &str) -> Result<Vec<LabSession>>;

    /// Questions scheduled for a student today
    async fn questions(&self, student_id: &str) -> Result<Vec<Question>>;

    /// Per-question status in one lab session
    async fn status(&self, student_id: &str, lab_session_id: &str) -> Result<Status>;

    /// Upload a solution and return the grading event stream
    async fn submit(&self, submission: &Submission) -> Result<SubmissionStream>;
}

/// HTTP implementation of [`GradingApi`]
#[derive(Debug, Clone)]
pub struct GradingClient {
    config: GradingClientConfig,
    http: reqwest::Client,
}

impl GradingClient {
    /// Create a client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: GradingClientConfig) -> Result<Self> {
        // Timeouts are per request; submission streams are left unbounded.
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Configuration in use
    pub fn config(&self) -> &GradingClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self
            .http
            .get(&url)
            .query(query)
            .timeout(self.config.timeout)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl GradingApi for GradingClient {
    async fn student(&self, student_id: &str) -> Result<Student> {
        let response = self
            .http
            .get(self.url("/api/stu"))
            .query(&[("studentId", student_id)])
            .timeout(self.config.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::BAD_REQUEST => Err(Error::InvalidStudent(student_id.to_string())),
            StatusCode::NOT_FOUND => Err(Error::StudentNotFound(student_id.to_string())),
            _ => {
                let response = ensure_success(response).await?;
                Ok(response.json().await?)
            }
        }
    }

    async fn lab_sessions(&self, student_id: &str) -> Result<Vec<LabSession>> {
        self.get_json("/api/stu/labsessions", &[("studentId", student_id)])
            .await
    }

    async fn questions(&self, student_id: &str) -> Result<Vec<Question>> {
        self.get_json("/api/stu/questions", &[("studentId", student_id)])
            .await
    }

    async fn status(&self, student_id: &str, lab_session_id: &str) -> Result<Status> {
        self.get_json(
            "/api/stu/status",
            &[("studentId", student_id), ("labSessionId", lab_session_id)],
        )
        .await
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmissionStream> {
        let bytes = tokio::fs::read(&submission.file_path).await?;
        let file_name = submission
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "solution".to_string());

        let mut form = Form::new()
            .part("solution", Part::bytes(bytes).file_name(file_name))
            .text("studentId", submission.student_id.clone())
            .text("questionId", submission.question_id.clone());
        if let Some(output) = &submission.user_output {
            form = form.text("userOutput", output.clone());
        }

        info!(
            student_id = %submission.student_id,
            question_id = %submission.question_id,
            "Submitting solution"
        );
        let response = self
            .http
            .post(self.url("/api/stu/submit"))
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(SubmissionStream::new(response))
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}

/// Grading events streamed back from a submission.
///
/// Ends at end of body or after an event marked `end`.
#[derive(Debug)]
pub struct SubmissionStream {
    response: Option<Response>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    body_done: bool,
    ended: bool,
}

impl SubmissionStream {
    fn new(response: Response) -> Self {
        Self {
            response: Some(response),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            body_done: false,
            ended: false,
        }
    }

    /// Stream over already-received `data:` payloads.
    pub fn from_payloads<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            response: None,
            decoder: SseDecoder::new(),
            pending: payloads.into_iter().map(Into::into).collect(),
            body_done: true,
            ended: false,
        }
    }

    /// Next event, or `None` once the stream is over.
    pub async fn next_event(&mut self) -> Result<Option<GradingEvent>> {
        loop {
            if self.ended {
                return Ok(None);
            }
            if let Some(data) = self.pending.pop_front() {
                let event = GradingEvent::parse(&data);
                debug!(kind = ?event.kind, end = event.end, "Grading event");
                if event.end {
                    self.ended = true;
                }
                return Ok(Some(event));
            }
            if self.body_done {
                self.ended = true;
                return Ok(None);
            }
            let chunk = match self.response.as_mut() {
                Some(response) => response.chunk().await?,
                None => None,
            };
            match chunk {
                Some(chunk) => self.pending.extend(self.decoder.push(&chunk)),
                None => {
                    self.body_done = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }

    /// Drain the remaining events.
    pub async fn collect(mut self) -> Result<Vec<GradingEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await? {
            events.push(event);
        }
        Ok(events)
    }
}
