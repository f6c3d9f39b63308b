use serde::{Deserialize, Serialize};

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// A four-option multiple choice question. Immutable once generated;
/// re-ordering the options produces a new value.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Question {
            text: text.into(),
            options,
            correct_index,
            explanation: explanation.into(),
        }
    }

    /// Checks the structural invariants: non-empty text, exactly four
    /// options, correct index in range. Returns the violation, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.options.len() != OPTION_COUNT {
            return Err(format!(
                "expected {} options, got {}",
                OPTION_COUNT,
                self.options.len()
            ));
        }
        if self.correct_index >= OPTION_COUNT {
            return Err(format!(
                "correct index {} out of range 0..{}",
                self.correct_index, OPTION_COUNT
            ));
        }
        Ok(())
    }

    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_index
    }
}
