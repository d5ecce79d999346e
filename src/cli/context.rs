//! Session state of the interactive shell

use biskut_client::{LabSession, Question, Student};

/// Who is logged in and what they are working on.
#[derive(Debug, Clone, Default)]
pub struct StudentContext {
    /// Id used for API calls
    pub student_id: String,
    /// Verified student record
    pub student: Option<Student>,
    /// Lab sessions offered to the student
    pub lab_sessions: Vec<LabSession>,
    /// Selected lab session
    pub lab_session_id: Option<String>,
    /// Questions of the selected session, or from the last `fetch`
    pub questions: Vec<Question>,
}

impl StudentContext {
    #[cfg(test)]
    pub fn new(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            ..Self::default()
        }
    }

    /// Record a verified student. The canonical id comes from the server.
    pub fn login(&mut self, student: Student) {
        self.student_id = student.id.to_string();
        self.student = Some(student);
    }

    /// Name used in the prompt
    pub fn display_name(&self) -> &str {
        self.student
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("biskut")
    }

    pub fn has_student(&self) -> bool {
        !self.student_id.is_empty()
    }

    /// Make a loaded lab session current and adopt its questions.
    pub fn select_session(&mut self, index: usize) -> Option<&LabSession> {
        let session = self.lab_sessions.get(index)?;
        self.lab_session_id = Some(session.id.to_string());
        self.questions = session.questions.clone();
        Some(session)
    }

    /// Loaded question with the given id
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        let question_id = question_id.trim();
        self.questions
            .iter()
            .find(|q| q.id.to_string() == question_id)
    }

    /// Lab session to report status for: the selected one, else the
    /// session of the first loaded question.
    pub fn status_session_id(&self) -> Option<String> {
        self.lab_session_id.clone().or_else(|| {
            self.questions
                .first()
                .map(|q| q.lab_session_id.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biskut_client::{Instructor, Program};

    fn question(id: i64, lab_session_id: i64) -> Question {
        Question {
            id,
            instructor_id: 1,
            lab_session_id,
            description: format!("Question {}", id),
            inputs_outputs: String::new(),
            test_case_based: true,
        }
    }

    #[test]
    fn test_login_uses_server_id() {
        let mut ctx = StudentContext::new(" 0131 ");
        ctx.login(Student {
            id: 131,
            name: "Asha".into(),
            email: String::new(),
            enrollment_number: String::new(),
            department_id: 0,
        });
        assert_eq!(ctx.student_id, "131");
        assert_eq!(ctx.display_name(), "Asha");
    }

    #[test]
    fn test_select_session_adopts_questions() {
        let mut ctx = StudentContext::new("131");
        ctx.lab_sessions.push(LabSession {
            id: 7,
            program_id: 1,
            instructor_id: 1,
            session_date: String::new(),
            description: String::new(),
            program: Program::default(),
            instructor: Instructor::default(),
            questions: vec![question(11, 7), question(12, 7)],
        });

        assert!(ctx.select_session(3).is_none());
        assert!(ctx.select_session(0).is_some());
        assert_eq!(ctx.lab_session_id.as_deref(), Some("7"));
        assert_eq!(ctx.question(" 12").map(|q| q.id), Some(12));
        assert!(ctx.question("13").is_none());
    }

    #[test]
    fn test_status_session_falls_back_to_questions() {
        let mut ctx = StudentContext::new("131");
        assert_eq!(ctx.status_session_id(), None);

        ctx.questions = vec![question(11, 9)];
        assert_eq!(ctx.status_session_id().as_deref(), Some("9"));

        ctx.lab_session_id = Some("7".into());
        assert_eq!(ctx.status_session_id().as_deref(), Some("7"));
    }
}
