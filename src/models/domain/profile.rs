use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl std::fmt::Display for BadgeRarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadgeRarity::Common => write!(f, "common"),
            BadgeRarity::Rare => write!(f, "rare"),
            BadgeRarity::Epic => write!(f, "epic"),
            BadgeRarity::Legendary => write!(f, "legendary"),
        }
    }
}

/// An earned badge. Appended to a profile once and never modified.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub criteria: String,
    pub rarity: BadgeRarity,
    pub earned_at: DateTime<Utc>,
}

/// Aggregate learning record for one principal. Mutated only through
/// attempt recording; the `version` field is the compare-and-swap token
/// that protects concurrent updates from the same identity.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct UserProfile {
    pub principal: String,
    pub total_quizzes: u32,
    pub correct_answers: u32,
    pub topic_scores: HashMap<String, u32>,
    pub streak: u32,
    pub level: u32,
    pub total_points: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
    pub badges: Vec<Badge>,
    pub version: u64,
}

impl UserProfile {
    pub fn new(principal: impl Into<String>) -> Self {
        UserProfile {
            principal: principal.into(),
            total_quizzes: 0,
            correct_answers: 0,
            topic_scores: HashMap::new(),
            streak: 0,
            level: 1,
            total_points: 0,
            last_active: None,
            badges: Vec::new(),
            version: 0,
        }
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b.id == badge_id)
    }
}
