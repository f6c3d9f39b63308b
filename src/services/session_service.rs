use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::session::{SessionError, SessionPhase},
    models::domain::{AttemptResult, Difficulty, QuizSession},
    models::dto::response::{SessionView, SubmitAnswerResponse},
    services::model_service::{fallback_feedback, QuizGateway},
    services::randomizer::QuestionRandomizer,
};

/// Owns the active quiz session of every principal: one session per
/// identity, replaced wholesale when a new quiz starts. All mutation goes
/// through the session's own transition methods; this layer adds the
/// gateway calls and the locking around them.
pub struct SessionService {
    gateway: Arc<dyn QuizGateway>,
    sessions: RwLock<HashMap<String, QuizSession>>,
}

fn no_active_session() -> AppError {
    AppError::NotFound("no active quiz session".to_string())
}

impl SessionService {
    pub fn new(gateway: Arc<dyn QuizGateway>) -> Self {
        Self {
            gateway,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a fresh session. Generation failures and malformed batches
    /// abort before any state changes; a previous session is only replaced
    /// once the new one is ready.
    pub async fn start(
        &self,
        principal: &str,
        topic: &str,
        difficulty: Difficulty,
        count: u32,
    ) -> AppResult<SessionView> {
        let generated = self.gateway.generate(topic, difficulty, count).await?;

        for (position, question) in generated.iter().enumerate() {
            question.validate().map_err(|reason| {
                AppError::Generation(format!(
                    "question {} has invalid structure: {}",
                    position + 1,
                    reason
                ))
            })?;
        }

        let questions = generated
            .iter()
            .map(QuestionRandomizer::randomize)
            .collect();
        let session = QuizSession::new(topic, difficulty, questions)
            .map_err(|_| AppError::Generation("no questions were generated".to_string()))?;
        let view = SessionView::from(&session);

        self.sessions
            .write()
            .await
            .insert(principal.to_string(), session);

        log::info!(
            "Started a {}-question '{}' session for {}",
            view.question_count,
            topic,
            principal
        );

        Ok(view)
    }

    pub async fn snapshot(&self, principal: &str) -> AppResult<SessionView> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(principal).ok_or_else(no_active_session)?;
        Ok(SessionView::from(session))
    }

    pub async fn select_option(&self, principal: &str, index: usize) -> AppResult<SessionView> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(principal).ok_or_else(no_active_session)?;
        session.select_option(index)?;
        Ok(SessionView::from(&*session))
    }

    /// Grade the staged selection. Correctness is decided locally before the
    /// feedback call; a feedback failure degrades to the stored explanation
    /// and never blocks progression. A duplicate submit while the first is
    /// in flight gets an "in flight" response instead of an error.
    pub async fn submit(&self, principal: &str) -> AppResult<SubmitAnswerResponse> {
        let (session_id, question_index, staged) = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(principal).ok_or_else(no_active_session)?;

            match session.begin_grading() {
                Ok(staged) => (
                    session.id().to_string(),
                    session.current_index(),
                    staged,
                ),
                Err(SessionError::SubmissionInFlight) => {
                    return Ok(SubmitAnswerResponse::in_flight());
                }
                Err(err) => return Err(err.into()),
            }
        };

        let feedback = match self
            .gateway
            .feedback(
                &staged.question.text,
                staged.selected,
                staged.question.correct_index,
                &staged.question.explanation,
                staged.is_correct,
            )
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback_feedback(&staged.question.explanation),
            Err(err) => {
                log::warn!(
                    "Feedback generation failed, falling back to stored explanation: {}",
                    err
                );
                fallback_feedback(&staged.question.explanation)
            }
        };

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(principal) {
            Some(session)
                if session.id() == session_id
                    && session.current_index() == question_index
                    && session.phase() == SessionPhase::Grading =>
            {
                session.finish_grading()?;
                Ok(SubmitAnswerResponse::graded(staged.is_correct, feedback))
            }
            // the learner abandoned or restarted mid-grade; the result is discarded
            _ => Err(AppError::InvalidTransition(
                "session is no longer accepting this submission".to_string(),
            )),
        }
    }

    pub async fn advance(&self, principal: &str) -> AppResult<SessionView> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(principal).ok_or_else(no_active_session)?;
        session.advance()?;
        Ok(SessionView::from(&*session))
    }

    pub async fn result(&self, principal: &str) -> AppResult<AttemptResult> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(principal).ok_or_else(no_active_session)?;
        Ok(session.result()?)
    }

    /// Drop the active session, if any. Discarding is idempotent.
    pub async fn abandon(&self, principal: &str) {
        self.sessions.write().await.remove(principal);
    }
}
