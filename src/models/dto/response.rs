use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::badges::BadgeSpec;
use crate::models::domain::{
    AttemptResult, Badge, BadgeRarity, Difficulty, Question, QuizSession, SessionPhase,
    UserProfile,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

impl From<Question> for QuestionDto {
    fn from(question: Question) -> Self {
        QuestionDto {
            question: question.text,
            options: question.options,
            correct_answer: question.correct_index,
            explanation: question.explanation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizMetadata {
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_count: usize,
    pub randomized: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizResponse {
    pub success: bool,
    pub questions: Vec<QuestionDto>,
    pub metadata: QuizMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAnswerResponse {
    pub success: bool,
    pub is_correct: bool,
    pub feedback: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorResponse {
    pub success: bool,
    pub reply: String,
}

/// What the presentation layer sees of the current question. The correct
/// index and explanation stay server-side until the answer is graded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuestionView {
    pub text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub phase: SessionPhase,
    pub current_index: usize,
    pub question_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<SessionQuestionView>,
}

impl From<&QuizSession> for SessionView {
    fn from(session: &QuizSession) -> Self {
        let question = match session.phase() {
            SessionPhase::Completed => None,
            _ => session.current_question().map(|q| SessionQuestionView {
                text: q.text.clone(),
                options: q.options.clone(),
            }),
        };

        SessionView {
            session_id: session.id().to_string(),
            topic: session.topic().to_string(),
            difficulty: session.difficulty(),
            phase: session.phase(),
            current_index: session.current_index(),
            question_count: session.question_count(),
            question,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl SubmitAnswerResponse {
    pub fn graded(is_correct: bool, feedback: String) -> Self {
        SubmitAnswerResponse {
            status: "graded",
            is_correct: Some(is_correct),
            feedback: Some(feedback),
        }
    }

    /// Response for a duplicate submit while the first is still in flight.
    pub fn in_flight() -> Self {
        SubmitAnswerResponse {
            status: "grading",
            is_correct: None,
            feedback: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResultDto {
    pub topic: String,
    pub difficulty: Difficulty,
    pub correct_count: u32,
    pub total_questions: u32,
    pub score_percent: u32,
}

impl From<AttemptResult> for AttemptResultDto {
    fn from(result: AttemptResult) -> Self {
        AttemptResultDto {
            topic: result.topic,
            difficulty: result.difficulty,
            correct_count: result.correct_count,
            total_questions: result.total_questions,
            score_percent: result.score_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub criteria: String,
    pub rarity: BadgeRarity,
    pub earned_at: DateTime<Utc>,
}

impl From<&Badge> for BadgeDto {
    fn from(badge: &Badge) -> Self {
        BadgeDto {
            id: badge.id.clone(),
            name: badge.name.clone(),
            description: badge.description.clone(),
            image_url: badge.image_url.clone(),
            criteria: badge.criteria.clone(),
            rarity: badge.rarity,
            earned_at: badge.earned_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicScoreDto {
    pub topic: String,
    pub score: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub principal: String,
    pub total_quizzes: u32,
    pub correct_answers: u32,
    pub topic_scores: Vec<TopicScoreDto>,
    pub streak: u32,
    pub level: u32,
    pub total_points: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
    pub badges: Vec<BadgeDto>,
}

impl From<&UserProfile> for ProfileResponse {
    fn from(profile: &UserProfile) -> Self {
        let mut topic_scores: Vec<TopicScoreDto> = profile
            .topic_scores
            .iter()
            .map(|(topic, score)| TopicScoreDto {
                topic: topic.clone(),
                score: *score,
            })
            .collect();
        topic_scores.sort_by(|a, b| a.topic.cmp(&b.topic));

        ProfileResponse {
            principal: profile.principal.clone(),
            total_quizzes: profile.total_quizzes,
            correct_answers: profile.correct_answers,
            topic_scores,
            streak: profile.streak,
            level: profile.level,
            total_points: profile.total_points,
            last_active: profile.last_active,
            badges: profile.badges.iter().map(BadgeDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableBadgeDto {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rarity: BadgeRarity,
}

impl From<&'static BadgeSpec> for AvailableBadgeDto {
    fn from(spec: &'static BadgeSpec) -> Self {
        AvailableBadgeDto {
            id: spec.id,
            name: spec.name,
            description: spec.description,
            icon: spec.icon,
            rarity: spec.rarity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAttemptResponse {
    pub profile: ProfileResponse,
    pub new_badges: Vec<BadgeDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryDto {
    pub rank: usize,
    pub principal: String,
    pub total_points: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicLeaderboardEntryDto {
    pub rank: usize,
    pub principal: String,
    pub score_percent: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatsResponse {
    pub total_users: u64,
    pub total_quizzes: u64,
    pub total_badges_awarded: u64,
    pub avg_score: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub api_key_configured: bool,
    pub connected_clients: usize,
    pub database: &'static str,
}

/// Events pushed over the dashboard update stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardUpdate {
    Connection {
        message: String,
        timestamp: i64,
    },
    Heartbeat {
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    AttemptRecorded {
        principal: String,
        topic: String,
        score_percent: u32,
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    BadgeEarned {
        principal: String,
        badge_id: String,
        name: String,
        rarity: BadgeRarity,
        timestamp: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::Question;

    #[test]
    fn question_dto_keeps_wire_field_names() {
        let dto = QuestionDto::from(Question::new(
            "Q?",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            2,
            "because",
        ));

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["question"], "Q?");
        assert_eq!(json["correctAnswer"], 2);
        assert_eq!(json["explanation"], "because");
    }

    #[test]
    fn session_view_never_leaks_the_correct_answer() {
        let questions = vec![Question::new(
            "Q?",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            1,
            "secret",
        )];
        let session =
            QuizSession::new("python", Difficulty::Medium, questions).unwrap();

        let view = SessionView::from(&session);
        let json = serde_json::to_string(&view).unwrap();

        assert!(!json.contains("correct"));
        assert!(!json.contains("secret"));
        assert!(json.contains("\"phase\":\"awaiting_answer\""));
    }

    #[test]
    fn profile_response_sorts_topic_scores() {
        let mut profile = UserProfile::new("p");
        profile.topic_scores.insert("python".to_string(), 80);
        profile.topic_scores.insert("ai".to_string(), 60);
        profile.topic_scores.insert("blockchain".to_string(), 90);

        let response = ProfileResponse::from(&profile);
        let topics: Vec<_> = response
            .topic_scores
            .iter()
            .map(|t| t.topic.as_str())
            .collect();
        assert_eq!(topics, vec!["ai", "blockchain", "python"]);
    }

    #[test]
    fn dashboard_update_is_tagged() {
        let update = DashboardUpdate::Heartbeat { timestamp: 123 };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["type"], "heartbeat");
        assert_eq!(json["timestamp"], 123);
    }
}
