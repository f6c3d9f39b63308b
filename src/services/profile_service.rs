use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    constants::badges::BADGE_CATALOG,
    errors::{AppError, AppResult},
    models::domain::{AttemptRecord, AttemptResult, Badge, UserProfile},
    models::dto::response::{LeaderboardEntryDto, QuizStatsResponse, TopicLeaderboardEntryDto},
    repositories::{AttemptRepository, ProfileRepository},
};

/// Points policy: flat award per correct answer plus a bonus for a clean
/// sweep. Levels are a fixed cumulative-points ladder; index = level - 1.
pub const POINTS_PER_CORRECT: u64 = 10;
pub const PERFECT_BONUS: u64 = 25;
pub const LEVEL_THRESHOLDS: &[u64] = &[0, 100, 250, 500, 1000, 2000, 3500, 5500, 8000, 12000];

const CAS_RETRY_LIMIT: usize = 5;

/// Outcome of folding one attempt into a profile.
#[derive(Debug)]
pub struct RecordedAttempt {
    pub profile: UserProfile,
    pub new_badges: Vec<Badge>,
    /// True when the attempt id had been seen before and nothing changed.
    pub already_recorded: bool,
}

pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileRepository>, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { profiles, attempts }
    }

    pub async fn get_profile(&self, principal: &str) -> AppResult<UserProfile> {
        self.profiles.get_or_create(principal).await
    }

    pub async fn get_badges(&self, principal: &str) -> AppResult<Vec<Badge>> {
        let profile = self.profiles.get_or_create(principal).await?;
        Ok(profile.badges)
    }

    /// Fold a completed attempt into the caller's profile. At most once per
    /// attempt id; concurrent updates from the same identity are serialized
    /// through the profile's version.
    pub async fn record_attempt(
        &self,
        principal: &str,
        result: AttemptResult,
        attempt_id: Option<String>,
    ) -> AppResult<RecordedAttempt> {
        if result.correct_count > result.total_questions {
            return Err(AppError::ValidationError(
                "correct count exceeds total questions".to_string(),
            ));
        }

        let now = Utc::now();
        let attempt_id = attempt_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let record = AttemptRecord::from_result(&attempt_id, principal, &result, now);

        if !self.attempts.insert_if_new(record).await? {
            let profile = self.profiles.get_or_create(principal).await?;
            return Ok(RecordedAttempt {
                profile,
                new_badges: Vec::new(),
                already_recorded: true,
            });
        }

        for _ in 0..CAS_RETRY_LIMIT {
            let current = self.profiles.get_or_create(principal).await?;
            let (mut updated, new_badges) = Self::apply_attempt(&current, &result, now);
            updated.version = current.version + 1;

            if self
                .profiles
                .compare_and_swap(current.version, updated.clone())
                .await?
            {
                log::info!(
                    "Recorded attempt {} for {}: {}% on '{}'",
                    attempt_id,
                    principal,
                    result.score_percent,
                    result.topic
                );
                return Ok(RecordedAttempt {
                    profile: updated,
                    new_badges,
                    already_recorded: false,
                });
            }

            log::warn!(
                "Profile update for {} lost a version race, retrying",
                principal
            );
        }

        Err(AppError::DatabaseError(format!(
            "profile update for {} kept losing version races",
            principal
        )))
    }

    /// Pure aggregation step: counters, last-write-wins topic score, streak,
    /// points, level, then badge evaluation against the updated numbers.
    pub fn apply_attempt(
        profile: &UserProfile,
        result: &AttemptResult,
        now: DateTime<Utc>,
    ) -> (UserProfile, Vec<Badge>) {
        let mut updated = profile.clone();

        updated.total_quizzes += 1;
        updated.correct_answers += result.correct_count;
        updated
            .topic_scores
            .insert(result.topic.clone(), result.score_percent);
        updated.streak = Self::updated_streak(profile.last_active, profile.streak, now);
        updated.total_points = profile.total_points + Self::points_for(result);
        updated.level = Self::level_for_points(updated.total_points);
        updated.last_active = Some(now);

        let new_badges = Self::evaluate_badges(&mut updated, result, now);
        (updated, new_badges)
    }

    /// Streak counts consecutive active calendar days (UTC). Same-day
    /// repeats don't double-count; a missed day resets to 1.
    fn updated_streak(last_active: Option<DateTime<Utc>>, streak: u32, now: DateTime<Utc>) -> u32 {
        let Some(last) = last_active else {
            return 1;
        };

        let days_apart = (now.date_naive() - last.date_naive()).num_days();
        match days_apart {
            0 => streak.max(1),
            1 => streak + 1,
            _ => 1,
        }
    }

    fn points_for(result: &AttemptResult) -> u64 {
        let mut points = result.correct_count as u64 * POINTS_PER_CORRECT;
        if result.is_perfect() {
            points += PERFECT_BONUS;
        }
        points
    }

    fn level_for_points(total_points: u64) -> u32 {
        LEVEL_THRESHOLDS
            .iter()
            .rposition(|&threshold| total_points >= threshold)
            .map(|index| index as u32 + 1)
            .unwrap_or(1)
    }

    /// Award any catalog badge whose criteria now hold. Already-earned
    /// badges are skipped, so re-evaluation never duplicates.
    fn evaluate_badges(
        profile: &mut UserProfile,
        result: &AttemptResult,
        now: DateTime<Utc>,
    ) -> Vec<Badge> {
        let mut earned = Vec::new();

        for spec in BADGE_CATALOG {
            if profile.has_badge(spec.id) {
                continue;
            }
            if spec.criteria.matches(profile, result) {
                let badge = Badge {
                    id: spec.id.to_string(),
                    name: spec.name.to_string(),
                    description: spec.description.to_string(),
                    image_url: spec.icon.to_string(),
                    criteria: spec.description.to_string(),
                    rarity: spec.rarity,
                    earned_at: now,
                };
                profile.badges.push(badge.clone());
                earned.push(badge);
            }
        }

        earned
    }

    pub async fn leaderboard(&self, limit: i64) -> AppResult<Vec<LeaderboardEntryDto>> {
        let profiles = self.profiles.list_top_by_points(limit).await?;

        Ok(profiles
            .into_iter()
            .enumerate()
            .map(|(index, profile)| LeaderboardEntryDto {
                rank: index + 1,
                principal: profile.principal,
                total_points: profile.total_points,
            })
            .collect())
    }

    pub async fn topic_leaderboard(
        &self,
        topic: &str,
        limit: i64,
    ) -> AppResult<Vec<TopicLeaderboardEntryDto>> {
        let entries = self.attempts.best_scores_for_topic(topic, limit).await?;

        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(index, (principal, score_percent))| TopicLeaderboardEntryDto {
                rank: index + 1,
                principal,
                score_percent,
            })
            .collect())
    }

    pub async fn stats(&self) -> AppResult<QuizStatsResponse> {
        let total_users = self.profiles.count().await?;
        let total_quizzes = self.attempts.count().await?;
        let total_badges_awarded = self.profiles.badge_total().await?;
        let avg_score = self.attempts.average_score().await?;

        Ok(QuizStatsResponse {
            total_users,
            total_quizzes,
            total_badges_awarded,
            avg_score,
        })
    }
}
