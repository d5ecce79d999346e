//! In-memory stand-ins for the grading server and the terminal picker.

use super::picker::Picker;
use async_trait::async_trait;
use biskut_client::{
    Error, GradingApi, Instructor, LabSession, Program, Question, Result, Status, Student,
    Submission, SubmissionStream,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

pub fn question(id: i64, test_case_based: bool) -> Question {
    Question {
        id,
        instructor_id: 3,
        lab_session_id: 7,
        description: format!("Question {}", id),
        inputs_outputs: "[]".into(),
        test_case_based,
    }
}

pub const GRADING_EVENTS: &[&str] = &[
    r#"{"pushed": true}"#,
    r#"{"start": true}"#,
    r#"{"status": "success", "output": "Compiled successfully"}"#,
    r#"{"passed": [{"input": "1 2"}], "failed": [], "time": 9, "status": "success", "end": true}"#,
];

/// Serves student 131 with lab session 7 (questions 11, 12, 21).
#[derive(Default)]
pub struct FakeApi {
    question_requests: Mutex<Vec<String>>,
    status_requests: Mutex<Vec<(String, String)>>,
    submissions: Mutex<Vec<Submission>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question_requests(&self) -> Vec<String> {
        self.question_requests.lock().unwrap().clone()
    }

    pub fn status_requests(&self) -> Vec<(String, String)> {
        self.status_requests.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl GradingApi for FakeApi {
    async fn student(&self, student_id: &str) -> Result<Student> {
        match student_id {
            "131" => Ok(Student {
                id: 131,
                name: "Asha".into(),
                email: "asha@example.edu".into(),
                enrollment_number: "CS2021".into(),
                department_id: 1,
            }),
            "abc" => Err(Error::InvalidStudent(student_id.into())),
            "down" => Err(Error::Network("connection refused".into())),
            _ => Err(Error::StudentNotFound(student_id.into())),
        }
    }

    async fn lab_sessions(&self, _student_id: &str) -> Result<Vec<LabSession>> {
        Ok(vec![LabSession {
            id: 7,
            program_id: 2,
            instructor_id: 3,
            session_date: "2024-03-01T00:00:00.000Z".into(),
            description: "Pointers".into(),
            program: Program {
                id: 2,
                name: "BTech CSE".into(),
                ..Program::default()
            },
            instructor: Instructor {
                id: 3,
                name: "Dr. Rao".into(),
                ..Instructor::default()
            },
            questions: vec![question(11, true), question(12, false), question(21, true)],
        }])
    }

    async fn questions(&self, student_id: &str) -> Result<Vec<Question>> {
        self.question_requests
            .lock()
            .unwrap()
            .push(student_id.to_string());
        Ok(vec![question(11, true), question(12, false)])
    }

    async fn status(&self, student_id: &str, lab_session_id: &str) -> Result<Status> {
        self.status_requests
            .lock()
            .unwrap()
            .push((student_id.to_string(), lab_session_id.to_string()));
        let status = BTreeMap::from([
            ("11".to_string(), "success".to_string()),
            ("12".to_string(), "failed".to_string()),
            ("21".to_string(), "Not Attempted".to_string()),
        ]);
        Ok(Status {
            student_id: student_id.to_string(),
            lab_session_id: lab_session_id.to_string(),
            status,
        })
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmissionStream> {
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(SubmissionStream::from_payloads(GRADING_EVENTS.iter().copied()))
    }
}

/// Answers picks from a script; an exhausted script backs out.
#[derive(Debug, Default)]
pub struct ScriptedPicker {
    answers: VecDeque<Option<usize>>,
    pub asked: Vec<&'static str>,
}

impl ScriptedPicker {
    pub fn new(answers: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

impl Picker for ScriptedPicker {
    fn pick_session(&mut self, _sessions: &[LabSession]) -> anyhow::Result<Option<usize>> {
        self.asked.push("session");
        Ok(self.answers.pop_front().flatten())
    }

    fn pick_question(&mut self, _questions: &[Question]) -> anyhow::Result<Option<usize>> {
        self.asked.push("question");
        Ok(self.answers.pop_front().flatten())
    }
}
