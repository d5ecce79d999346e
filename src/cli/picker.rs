//! Searchable selection lists

use super::display::{format_session_date, session_label};
use anyhow::Result;
use biskut_client::{LabSession, Question};
use inquire::{InquireError, Select};
use std::fmt;

const PAGE_SIZE: usize = 10;

/// Chooses one entry from a list. `Ok(None)` means the user backed out.
pub trait Picker {
    /// Pick a lab session
    fn pick_session(&mut self, sessions: &[LabSession]) -> Result<Option<usize>>;

    /// Pick a question
    fn pick_question(&mut self, questions: &[Question]) -> Result<Option<usize>>;
}

/// Whether a lab session matches a search filter.
///
/// Program and instructor names match case-insensitively, the date
/// as written.
pub fn session_matches(session: &LabSession, filter: &str) -> bool {
    let needle = filter.to_lowercase();
    session.program.name.to_lowercase().contains(&needle)
        || session.session_date.contains(filter)
        || format_session_date(&session.session_date).contains(filter)
        || session.instructor.name.to_lowercase().contains(&needle)
}

/// Whether a question matches a search filter (description or id).
pub fn question_matches(question: &Question, filter: &str) -> bool {
    question
        .description
        .to_lowercase()
        .contains(&filter.to_lowercase())
        || question.id.to_string().contains(filter)
}

struct SessionChoice<'a> {
    index: usize,
    session: &'a LabSession,
}

impl fmt::Display for SessionChoice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {}",
            session_label(self.session),
            self.session.instructor.name
        )
    }
}

struct QuestionChoice<'a> {
    index: usize,
    question: &'a Question,
}

impl fmt::Display for QuestionChoice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {})", self.question.description, self.question.id)
    }
}

fn score_session(filter: &str, choice: &SessionChoice<'_>, _: &str, _: usize) -> Option<i64> {
    session_matches(choice.session, filter).then_some(0)
}

fn score_question(filter: &str, choice: &QuestionChoice<'_>, _: &str, _: usize) -> Option<i64> {
    question_matches(choice.question, filter).then_some(0)
}

/// Terminal picker backed by `inquire`
#[derive(Debug, Default)]
pub struct InquirePicker;

impl Picker for InquirePicker {
    fn pick_session(&mut self, sessions: &[LabSession]) -> Result<Option<usize>> {
        let choices = sessions
            .iter()
            .enumerate()
            .map(|(index, session)| SessionChoice { index, session })
            .collect();

        let picked = Select::new("Select a lab session", choices)
            .with_page_size(PAGE_SIZE)
            .with_scorer(&score_session)
            .prompt_skippable();
        skippable(picked.map(|c| c.map(|c| c.index)))
    }

    fn pick_question(&mut self, questions: &[Question]) -> Result<Option<usize>> {
        let choices = questions
            .iter()
            .enumerate()
            .map(|(index, question)| QuestionChoice { index, question })
            .collect();

        let picked = Select::new("Select a question to view details", choices)
            .with_page_size(PAGE_SIZE)
            .with_scorer(&score_question)
            .prompt_skippable();
        skippable(picked.map(|c| c.map(|c| c.index)))
    }
}

fn skippable(picked: std::result::Result<Option<usize>, InquireError>) -> Result<Option<usize>> {
    match picked {
        Ok(index) => Ok(index),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(anyhow::anyhow!("Prompt failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biskut_client::{Instructor, Program};

    fn session(name: &str, date: &str, instructor: &str) -> LabSession {
        LabSession {
            id: 1,
            program_id: 1,
            instructor_id: 1,
            session_date: date.to_string(),
            description: String::new(),
            program: Program {
                name: name.to_string(),
                ..Program::default()
            },
            instructor: Instructor {
                name: instructor.to_string(),
                ..Instructor::default()
            },
            questions: Vec::new(),
        }
    }

    #[test]
    fn test_session_search() {
        let s = session("BTech CSE", "2024-03-01T09:30:00.000Z", "Dr. Rao");
        assert!(session_matches(&s, "cse"));
        assert!(session_matches(&s, "rao"));
        assert!(session_matches(&s, "2024-03"));
        assert!(!session_matches(&s, "physics"));
    }

    #[test]
    fn test_question_search() {
        let q = Question {
            id: 42,
            instructor_id: 1,
            lab_session_id: 1,
            description: "Reverse a Linked List".into(),
            inputs_outputs: String::new(),
            test_case_based: true,
        };
        assert!(question_matches(&q, "linked"));
        assert!(question_matches(&q, "42"));
        assert!(!question_matches(&q, "tree"));
    }

    #[test]
    fn test_cancel_is_not_an_error() {
        assert_eq!(skippable(Err(InquireError::OperationCanceled)).unwrap(), None);
        assert!(skippable(Err(InquireError::NotTTY)).is_err());
    }
}
