use std::time::Duration;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Config,
    constants::prompts,
    errors::{AppError, AppResult},
    models::domain::question::OPTION_COUNT,
    models::domain::{Difficulty, Question},
    models::dto::request::TutorMessage,
};

/// Upstream question source consumed by the session machine. Implemented
/// against a live model API in production and stubbed in tests.
#[async_trait]
pub trait QuizGateway: Send + Sync {
    /// Produce `count` validated questions. Any malformed question anywhere
    /// in the batch fails the whole call; partial batches are never
    /// returned.
    async fn generate(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: u32,
    ) -> AppResult<Vec<Question>>;

    /// Encouragement text for a graded answer. Correctness is an input
    /// here, never an output: callers decide it locally and fall back to
    /// the stored explanation when this fails.
    async fn feedback(
        &self,
        question: &str,
        user_answer: usize,
        correct_answer: usize,
        explanation: &str,
        is_correct: bool,
    ) -> AppResult<String>;
}

// Model replies arrive as prose-wrapped JSON more often than not; strip
// code fences first, then take the outermost array.
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`{3,6}\w*").expect("CODE_FENCE is a valid regex pattern"));
static JSON_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("JSON_ARRAY is a valid regex pattern"));

#[derive(Debug, Deserialize)]
struct GeneratedQuestionDto {
    question: String,
    options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    correct_answer: i64,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionEnvelope {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct ModelService {
    client: Client<OpenAIConfig>,
    model: String,
    generation_timeout: Duration,
    feedback_timeout: Duration,
    api_key_configured: bool,
}

impl ModelService {
    pub fn new(config: &Config) -> Self {
        let api_config = OpenAIConfig::new()
            .with_api_base(&config.model_api_base)
            .with_api_key(config.model_api_key.expose_secret());

        ModelService {
            client: Client::with_config(api_config),
            model: config.model_name.clone(),
            generation_timeout: Duration::from_secs(config.generation_timeout_secs),
            feedback_timeout: Duration::from_secs(config.feedback_timeout_secs),
            api_key_configured: config.api_key_configured(),
        }
    }

    pub fn api_key_configured(&self) -> bool {
        self.api_key_configured
    }

    /// Free-form chat pass-through for the tutor surface.
    pub async fn tutor_reply(&self, messages: &[TutorMessage]) -> AppResult<String> {
        if !self.api_key_configured {
            return Err(AppError::Generation("API key not configured".to_string()));
        }

        let messages = serde_json::to_value(messages)?;
        let reply = self
            .complete(
                messages,
                prompts::TUTOR_TEMPERATURE,
                Some(prompts::TUTOR_MAX_TOKENS),
                self.feedback_timeout,
            )
            .await?;

        Ok(reply.trim().to_string())
    }

    async fn complete(
        &self,
        messages: serde_json::Value,
        temperature: f32,
        max_tokens: Option<u32>,
        timeout: Duration,
    ) -> AppResult<String> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
        });
        if let Some(max_tokens) = max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let chat = self.client.chat();
        let request = chat.create_byot(body);
        let response: ChatCompletionEnvelope = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| {
                AppError::Generation(format!("model call timed out after {:?}", timeout))
            })?
            .map_err(|err| AppError::Generation(format!("model call failed: {}", err)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AppError::Generation("model response has no message content".to_string())
            })
    }
}

/// Feedback text used whenever the model cannot supply any.
pub(crate) fn fallback_feedback(explanation: &str) -> String {
    if explanation.trim().is_empty() {
        "No explanation available.".to_string()
    } else {
        explanation.to_string()
    }
}

/// Extract and validate a question batch from raw model output. The whole
/// batch is rejected on the first malformed question.
pub fn parse_question_batch(raw: &str) -> AppResult<Vec<Question>> {
    let cleaned = CODE_FENCE.replace_all(raw.trim(), "");

    let array = JSON_ARRAY
        .find(&cleaned)
        .ok_or_else(|| AppError::Generation("no JSON array found in model response".to_string()))?;

    let parsed: Vec<GeneratedQuestionDto> = serde_json::from_str(array.as_str())
        .map_err(|err| AppError::Generation(format!("failed to parse questions: {}", err)))?;

    if parsed.is_empty() {
        return Err(AppError::Generation(
            "model returned an empty question batch".to_string(),
        ));
    }

    let mut questions = Vec::with_capacity(parsed.len());
    for (position, dto) in parsed.into_iter().enumerate() {
        if dto.correct_answer < 0 || dto.correct_answer >= OPTION_COUNT as i64 {
            return Err(AppError::Generation(format!(
                "question {} has invalid structure: correct answer index {} out of range",
                position + 1,
                dto.correct_answer
            )));
        }

        let question = Question::new(
            dto.question,
            dto.options,
            dto.correct_answer as usize,
            dto.explanation,
        );
        question.validate().map_err(|reason| {
            AppError::Generation(format!(
                "question {} has invalid structure: {}",
                position + 1,
                reason
            ))
        })?;

        questions.push(question);
    }

    Ok(questions)
}

#[async_trait]
impl QuizGateway for ModelService {
    async fn generate(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: u32,
    ) -> AppResult<Vec<Question>> {
        if !self.api_key_configured {
            return Err(AppError::Generation("API key not configured".to_string()));
        }

        log::info!(
            "Requesting {} questions for topic '{}' at {} difficulty",
            count,
            topic,
            difficulty
        );

        let prompt = prompts::quiz_prompt(topic, difficulty, count);
        let messages = json!([{ "role": "user", "content": prompt }]);
        let raw = self
            .complete(
                messages,
                prompts::generation_temperature(difficulty),
                None,
                self.generation_timeout,
            )
            .await?;

        let questions = parse_question_batch(&raw)?;
        log::info!(
            "Generated {} questions for topic '{}'",
            questions.len(),
            topic
        );

        Ok(questions)
    }

    async fn feedback(
        &self,
        question: &str,
        user_answer: usize,
        correct_answer: usize,
        explanation: &str,
        is_correct: bool,
    ) -> AppResult<String> {
        if !self.api_key_configured {
            return Err(AppError::Generation("API key not configured".to_string()));
        }

        let prompt =
            prompts::feedback_prompt(question, user_answer, correct_answer, explanation, is_correct);
        let messages = json!([{ "role": "user", "content": prompt }]);

        let reply = self
            .complete(
                messages,
                prompts::FEEDBACK_TEMPERATURE,
                None,
                self.feedback_timeout,
            )
            .await?;

        Ok(reply.trim().to_string())
    }
}
