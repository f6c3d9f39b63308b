use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::domain::attempt::AttemptResult;
use crate::models::domain::question::{Difficulty, Question, OPTION_COUNT};

/// Where a session currently sits in its lifecycle.
///
/// `AwaitingAnswer` accepts selections, `Grading` means a submission is in
/// flight, `Graded` means feedback is available and the session is waiting
/// to move on, `Completed` means every question has been answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    AwaitingAnswer,
    Grading,
    Graded,
    Completed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::AwaitingAnswer => write!(f, "awaiting_answer"),
            SessionPhase::Grading => write!(f, "grading"),
            SessionPhase::Graded => write!(f, "graded"),
            SessionPhase::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a session needs at least one question")]
    NoQuestions,

    #[error("option index {0} is out of range")]
    OptionOutOfRange(usize),

    #[error("no option has been selected")]
    NothingSelected,

    #[error("a submission for this question is already in flight")]
    SubmissionInFlight,

    #[error("'{operation}' is not valid in the {phase} phase")]
    PhaseMismatch {
        operation: &'static str,
        phase: SessionPhase,
    },
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::InvalidTransition(err.to_string())
    }
}

/// The selection captured when grading begins. Correctness is decided here,
/// locally, before any feedback service is consulted.
#[derive(Clone, Debug)]
pub struct StagedAnswer {
    pub question: Question,
    pub selected: usize,
    pub is_correct: bool,
}

/// One quiz attempt in progress. Owned by exactly one learner; all methods
/// are synchronous transitions that either apply cleanly or leave the
/// session untouched.
#[derive(Clone, Debug)]
pub struct QuizSession {
    id: String,
    topic: String,
    difficulty: Difficulty,
    questions: Vec<Question>,
    current_index: usize,
    answers: Vec<usize>,
    staged: Option<usize>,
    phase: SessionPhase,
}

impl QuizSession {
    pub fn new(
        topic: impl Into<String>,
        difficulty: Difficulty,
        questions: Vec<Question>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        Ok(QuizSession {
            id: Uuid::new_v4().to_string(),
            topic: topic.into(),
            difficulty,
            questions,
            current_index: 0,
            answers: Vec::new(),
            staged: None,
            phase: SessionPhase::AwaitingAnswer,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn answers(&self) -> &[usize] {
        &self.answers
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// Stage a selection for the current question. Overwritable until the
    /// answer is submitted.
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Err(SessionError::PhaseMismatch {
                operation: "select_option",
                phase: self.phase,
            });
        }
        if index >= OPTION_COUNT {
            return Err(SessionError::OptionOutOfRange(index));
        }

        self.staged = Some(index);
        Ok(())
    }

    /// Lock in the staged selection and enter `Grading`. A second call while
    /// grading reports `SubmissionInFlight`, which callers treat as a
    /// duplicate-event no-op rather than a failure.
    pub fn begin_grading(&mut self) -> Result<StagedAnswer, SessionError> {
        match self.phase {
            SessionPhase::Grading => Err(SessionError::SubmissionInFlight),
            SessionPhase::AwaitingAnswer => {
                let selected = self.staged.ok_or(SessionError::NothingSelected)?;
                let question = self.questions[self.current_index].clone();
                self.phase = SessionPhase::Grading;

                Ok(StagedAnswer {
                    is_correct: question.is_correct(selected),
                    question,
                    selected,
                })
            }
            phase => Err(SessionError::PhaseMismatch {
                operation: "submit",
                phase,
            }),
        }
    }

    /// Record the in-flight answer once grading has resolved.
    pub fn finish_grading(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Grading {
            return Err(SessionError::PhaseMismatch {
                operation: "finish_grading",
                phase: self.phase,
            });
        }

        let selected = self.staged.take().ok_or(SessionError::NothingSelected)?;
        self.answers.push(selected);
        self.phase = SessionPhase::Graded;
        Ok(())
    }

    /// Move to the next question, or to `Completed` after the last one.
    /// The index only ever moves forward.
    pub fn advance(&mut self) -> Result<SessionPhase, SessionError> {
        if self.phase != SessionPhase::Graded {
            return Err(SessionError::PhaseMismatch {
                operation: "advance",
                phase: self.phase,
            });
        }

        self.current_index += 1;
        self.phase = if self.current_index >= self.questions.len() {
            SessionPhase::Completed
        } else {
            SessionPhase::AwaitingAnswer
        };

        Ok(self.phase)
    }

    pub fn result(&self) -> Result<AttemptResult, SessionError> {
        if self.phase != SessionPhase::Completed {
            return Err(SessionError::PhaseMismatch {
                operation: "result",
                phase: self.phase,
            });
        }

        let correct_count = self
            .answers
            .iter()
            .zip(&self.questions)
            .filter(|(answer, question)| question.is_correct(**answer))
            .count() as u32;

        Ok(AttemptResult::new(
            self.topic.clone(),
            self.difficulty,
            correct_count,
            self.questions.len() as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct_index: usize) -> Question {
        Question::new(
            "Which option is right?",
            vec![
                "first".to_string(),
                "second".to_string(),
                "third".to_string(),
                "fourth".to_string(),
            ],
            correct_index,
            "Because it is.",
        )
    }

    fn session(count: usize) -> QuizSession {
        let questions = (0..count).map(|i| question(i % OPTION_COUNT)).collect();
        QuizSession::new("javascript", Difficulty::Medium, questions).unwrap()
    }

    fn answer_current(session: &mut QuizSession, index: usize) {
        session.select_option(index).unwrap();
        session.begin_grading().unwrap();
        session.finish_grading().unwrap();
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let result = QuizSession::new("javascript", Difficulty::Easy, vec![]);
        assert_eq!(result.unwrap_err(), SessionError::NoQuestions);
    }

    #[test]
    fn five_question_session_runs_to_completion() {
        let mut s = session(5);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.question_count(), 5);

        for i in 0..5 {
            assert_eq!(s.phase(), SessionPhase::AwaitingAnswer);
            assert_eq!(s.answers().len(), s.current_index());
            answer_current(&mut s, i % OPTION_COUNT);
            s.advance().unwrap();
        }

        assert_eq!(s.phase(), SessionPhase::Completed);
        assert_eq!(s.answers().len(), 5);
        assert_eq!(s.current_index(), 5);
    }

    #[test]
    fn result_counts_correct_answers() {
        let mut s = session(5);
        // question i expects answer i % 4; get the first three right
        for i in 0..5 {
            let answer = if i < 3 { i % OPTION_COUNT } else { (i + 1) % OPTION_COUNT };
            answer_current(&mut s, answer);
            s.advance().unwrap();
        }

        let result = s.result().unwrap();
        assert_eq!(result.correct_count, 3);
        assert_eq!(result.total_questions, 5);
        assert_eq!(result.score_percent, 60);
    }

    #[test]
    fn selection_is_overwritable_until_submit() {
        let mut s = session(1);
        s.select_option(0).unwrap();
        s.select_option(2).unwrap();
        s.begin_grading().unwrap();
        s.finish_grading().unwrap();
        assert_eq!(s.answers(), &[2]);
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let mut s = session(1);
        assert_eq!(
            s.select_option(4).unwrap_err(),
            SessionError::OptionOutOfRange(4)
        );
    }

    #[test]
    fn submit_without_selection_is_rejected() {
        let mut s = session(1);
        assert_eq!(
            s.begin_grading().unwrap_err(),
            SessionError::NothingSelected
        );
        assert_eq!(s.phase(), SessionPhase::AwaitingAnswer);
    }

    #[test]
    fn duplicate_submit_reports_in_flight() {
        let mut s = session(2);
        s.select_option(1).unwrap();
        s.begin_grading().unwrap();

        assert_eq!(
            s.begin_grading().unwrap_err(),
            SessionError::SubmissionInFlight
        );
        // the in-flight submission is untouched
        assert_eq!(s.phase(), SessionPhase::Grading);
        s.finish_grading().unwrap();
        assert_eq!(s.answers(), &[1]);
    }

    #[test]
    fn select_while_grading_is_rejected() {
        let mut s = session(2);
        s.select_option(1).unwrap();
        s.begin_grading().unwrap();

        assert!(matches!(
            s.select_option(0),
            Err(SessionError::PhaseMismatch { .. })
        ));
    }

    #[test]
    fn advance_before_grading_resolves_is_rejected() {
        let mut s = session(2);
        s.select_option(1).unwrap();
        s.begin_grading().unwrap();

        assert!(matches!(
            s.advance(),
            Err(SessionError::PhaseMismatch { .. })
        ));
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn result_before_completion_is_rejected() {
        let mut s = session(2);
        answer_current(&mut s, 0);
        s.advance().unwrap();

        assert!(matches!(
            s.result(),
            Err(SessionError::PhaseMismatch { .. })
        ));
    }

    #[test]
    fn correctness_is_decided_at_submission() {
        let mut s = session(1);
        s.select_option(0).unwrap();
        let staged = s.begin_grading().unwrap();
        assert!(staged.is_correct);

        let mut s = session(1);
        s.select_option(3).unwrap();
        let staged = s.begin_grading().unwrap();
        assert!(!staged.is_correct);
    }
}
