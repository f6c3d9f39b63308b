use crate::models::domain::{AttemptResult, BadgeRarity, UserProfile};

/// Machine-checkable eligibility rule for a badge. Evaluated against the
/// profile *after* the attempt has been folded in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeCriteria {
    TotalQuizzes(u32),
    CorrectAnswers(u32),
    StreakDays(u32),
    PerfectScore,
    LevelReached(u32),
}

impl BadgeCriteria {
    pub fn matches(&self, profile: &UserProfile, result: &AttemptResult) -> bool {
        match *self {
            BadgeCriteria::TotalQuizzes(n) => profile.total_quizzes >= n,
            BadgeCriteria::CorrectAnswers(n) => profile.correct_answers >= n,
            BadgeCriteria::StreakDays(n) => profile.streak >= n,
            BadgeCriteria::PerfectScore => result.is_perfect(),
            BadgeCriteria::LevelReached(n) => profile.level >= n,
        }
    }
}

pub struct BadgeSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rarity: BadgeRarity,
    pub criteria: BadgeCriteria,
}

pub static BADGE_CATALOG: &[BadgeSpec] = &[
    BadgeSpec {
        id: "first-steps",
        name: "First Steps",
        description: "Complete your first quiz",
        icon: "🎯",
        rarity: BadgeRarity::Common,
        criteria: BadgeCriteria::TotalQuizzes(1),
    },
    BadgeSpec {
        id: "quiz-explorer",
        name: "Quiz Explorer",
        description: "Complete 10 quizzes",
        icon: "🧭",
        rarity: BadgeRarity::Common,
        criteria: BadgeCriteria::TotalQuizzes(10),
    },
    BadgeSpec {
        id: "quiz-veteran",
        name: "Quiz Veteran",
        description: "Complete 50 quizzes",
        icon: "🏆",
        rarity: BadgeRarity::Rare,
        criteria: BadgeCriteria::TotalQuizzes(50),
    },
    BadgeSpec {
        id: "perfectionist",
        name: "Perfectionist",
        description: "Score 100% on a quiz",
        icon: "💯",
        rarity: BadgeRarity::Rare,
        criteria: BadgeCriteria::PerfectScore,
    },
    BadgeSpec {
        id: "on-fire",
        name: "On Fire",
        description: "Keep a 3-day streak going",
        icon: "🔥",
        rarity: BadgeRarity::Rare,
        criteria: BadgeCriteria::StreakDays(3),
    },
    BadgeSpec {
        id: "unstoppable",
        name: "Unstoppable",
        description: "Keep a 7-day streak going",
        icon: "⚡",
        rarity: BadgeRarity::Epic,
        criteria: BadgeCriteria::StreakDays(7),
    },
    BadgeSpec {
        id: "century-club",
        name: "Century Club",
        description: "Answer 100 questions correctly",
        icon: "💡",
        rarity: BadgeRarity::Epic,
        criteria: BadgeCriteria::CorrectAnswers(100),
    },
    BadgeSpec {
        id: "grandmaster",
        name: "Grandmaster",
        description: "Reach level 5",
        icon: "👑",
        rarity: BadgeRarity::Legendary,
        criteria: BadgeCriteria::LevelReached(5),
    },
];

pub fn find_spec(badge_id: &str) -> Option<&'static BadgeSpec> {
    BADGE_CATALOG.iter().find(|spec| spec.id == badge_id)
}
