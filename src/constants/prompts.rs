use crate::models::domain::Difficulty;

/// Human-readable subject line for the built-in topics. Unknown topics are
/// passed through verbatim so new subjects work without a code change.
fn topic_label(topic: &str) -> &str {
    match topic {
        "javascript" => "JavaScript programming",
        "python" => "Python programming",
        "blockchain" => "blockchain technology and cryptocurrency",
        "ai" => "artificial intelligence and machine learning",
        "webdev" => "web development",
        "icp" => "Internet Computer Protocol (ICP)",
        other => other,
    }
}

/// Prompt asking the model for a batch of multiple choice questions as a
/// bare JSON array. The format block is load-bearing: the response parser
/// expects exactly this shape.
pub fn quiz_prompt(topic: &str, difficulty: Difficulty, count: u32) -> String {
    format!(
        r#"Generate {count} multiple choice questions about {label} at {difficulty} difficulty level. Each question should have 4 options, specify the correct answer (index 0-3), and provide a brief explanation.

Difficulty guidelines:
- Easy: Basic concepts, straightforward questions, fundamental syntax
- Medium: Intermediate concepts, some problem-solving, practical applications
- Hard: Advanced concepts, complex scenarios, edge cases, optimization

IMPORTANT: Randomize the correct answer position. Do NOT always put the correct answer as the first option. Mix up the correct answer positions across different questions.

Format response as a valid JSON array:
[
  {{
    "question": "What is the correct way to declare a variable in JavaScript?",
    "options": ["variable x = 5", "var x = 5", "declare x = 5", "x := 5"],
    "correctAnswer": 1,
    "explanation": "In JavaScript, 'var' is one of the ways to declare a variable."
  }}
]
NO markdown, NO extra text, ONLY the JSON array."#,
        count = count,
        label = topic_label(topic),
        difficulty = difficulty,
    )
}

/// Prompt for short encouragement after an answer. The model never decides
/// correctness; that is settled locally before this prompt is built.
pub fn feedback_prompt(
    question: &str,
    user_answer: usize,
    correct_answer: usize,
    explanation: &str,
    is_correct: bool,
) -> String {
    let tone = if is_correct {
        "congratulates them and adds an interesting fact"
    } else {
        "gently explains why their answer was incorrect and provides the correct answer"
    };

    format!(
        "User answered option {user_answer} to: \"{question}\". The correct answer was option \
         {correct_answer}. Original explanation: \"{explanation}\". Provide encouraging feedback \
         (max 50 words) that {tone}."
    )
}

/// Sampling temperature per difficulty; harder quizzes get more variety.
pub fn generation_temperature(difficulty: Difficulty) -> f32 {
    match difficulty {
        Difficulty::Easy => 0.7,
        Difficulty::Medium => 0.8,
        Difficulty::Hard => 0.9,
    }
}

pub const FEEDBACK_TEMPERATURE: f32 = 0.3;
pub const TUTOR_TEMPERATURE: f32 = 0.7;
pub const TUTOR_MAX_TOKENS: u32 = 512;
