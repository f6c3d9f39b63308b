use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::question::Difficulty;

/// Outcome of one completed run through a question set. Derived once at
/// session completion and never modified.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptResult {
    pub topic: String,
    pub difficulty: Difficulty,
    pub correct_count: u32,
    pub total_questions: u32,
    pub score_percent: u32,
}

impl AttemptResult {
    /// `score_percent` rounds half away from zero: 3/5 -> 60, 1/3 -> 33,
    /// 1/8 -> 13.
    pub fn new(
        topic: impl Into<String>,
        difficulty: Difficulty,
        correct_count: u32,
        total_questions: u32,
    ) -> Self {
        let score_percent = if total_questions == 0 {
            0
        } else {
            (correct_count as f64 / total_questions as f64 * 100.0).round() as u32
        };

        AttemptResult {
            topic: topic.into(),
            difficulty,
            correct_count,
            total_questions,
            score_percent,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.total_questions > 0 && self.correct_count == self.total_questions
    }
}

/// Persisted record of a submitted attempt, keyed by `attempt_id` so a
/// retried submission can be detected and ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptRecord {
    pub attempt_id: String,
    pub principal: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub correct_count: u32,
    pub total_questions: u32,
    pub score_percent: u32,
    pub submitted_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn from_result(
        attempt_id: impl Into<String>,
        principal: impl Into<String>,
        result: &AttemptResult,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        AttemptRecord {
            attempt_id: attempt_id.into(),
            principal: principal.into(),
            topic: result.topic.clone(),
            difficulty: result.difficulty,
            correct_count: result.correct_count,
            total_questions: result.total_questions,
            score_percent: result.score_percent,
            submitted_at,
        }
    }
}
