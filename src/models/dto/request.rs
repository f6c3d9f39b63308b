use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::Difficulty;

/// Parameters for a quiz generation call, shared by the raw generation
/// endpoint and session start. Field defaults match the browser client's
/// historical behavior.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    #[serde(default = "default_topic")]
    #[validate(length(min = 1, max = 64))]
    pub topic: String,

    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = 20))]
    pub num_questions: u32,

    #[serde(default)]
    pub difficulty: Difficulty,
}

fn default_topic() -> String {
    "javascript".to_string()
}

fn default_question_count() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GradeAnswerRequest {
    #[serde(default)]
    pub topic: String,

    #[validate(length(min = 1))]
    pub question: String,

    #[validate(range(max = 3))]
    pub user_answer: usize,

    #[validate(range(max = 3))]
    pub correct_answer: usize,

    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptionRequest {
    #[validate(range(max = 3))]
    pub option_index: usize,
}

/// Attempt submission payload. `attempt_id` is the caller's idempotency
/// key; resubmitting the same id is a no-op.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordAttemptRequest {
    pub attempt_id: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub topic: String,

    #[serde(default)]
    pub difficulty: Difficulty,

    pub correct_count: u32,

    #[validate(range(min = 1, max = 100))]
    pub total_questions: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TutorMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TutorRequest {
    #[validate(length(min = 1, max = 50))]
    pub messages: Vec<TutorMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

impl LeaderboardQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_applies_defaults() {
        let request: GenerateQuizRequest = serde_json::from_str("{}").unwrap();

        assert_eq!(request.topic, "javascript");
        assert_eq!(request.num_questions, 5);
        assert_eq!(request.difficulty, Difficulty::Medium);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn generate_request_reads_camel_case() {
        let request: GenerateQuizRequest =
            serde_json::from_str(r#"{"topic":"ai","numQuestions":10,"difficulty":"hard"}"#)
                .unwrap();

        assert_eq!(request.topic, "ai");
        assert_eq!(request.num_questions, 10);
        assert_eq!(request.difficulty, Difficulty::Hard);
    }

    #[test]
    fn generate_request_rejects_zero_questions() {
        let request: GenerateQuizRequest =
            serde_json::from_str(r#"{"topic":"ai","numQuestions":0}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn grade_request_rejects_out_of_range_answer() {
        let request: GradeAnswerRequest = serde_json::from_str(
            r#"{"question":"Q?","userAnswer":7,"correctAnswer":1}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn record_attempt_reads_camel_case() {
        let request: RecordAttemptRequest = serde_json::from_str(
            r#"{"attemptId":"abc","topic":"python","correctCount":4,"totalQuestions":5}"#,
        )
        .unwrap();

        assert_eq!(request.attempt_id.as_deref(), Some("abc"));
        assert_eq!(request.correct_count, 4);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn leaderboard_query_clamps_limit() {
        assert_eq!(LeaderboardQuery { limit: None }.limit(), 10);
        assert_eq!(LeaderboardQuery { limit: Some(500) }.limit(), 100);
        assert_eq!(LeaderboardQuery { limit: Some(0) }.limit(), 1);
    }
}
