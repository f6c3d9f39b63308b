use std::{
    collections::HashMap,
    sync::atomic::{AtomicU32, Ordering},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use quizmill_server::{
    errors::{AppError, AppResult},
    models::domain::{AttemptRecord, AttemptResult, Difficulty, UserProfile},
    repositories::{AttemptRepository, ProfileRepository},
    services::ProfileService,
};

struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<String, UserProfile>>>,
    // forces the next N compare_and_swap calls to report a lost race
    forced_conflicts: AtomicU32,
}

impl InMemoryProfileRepository {
    fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
            forced_conflicts: AtomicU32::new(0),
        }
    }

    fn with_forced_conflicts(conflicts: u32) -> Self {
        let repo = Self::new();
        repo.forced_conflicts.store(conflicts, Ordering::SeqCst);
        repo
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find(&self, principal: &str) -> AppResult<Option<UserProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(principal).cloned())
    }

    async fn get_or_create(&self, principal: &str) -> AppResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles
            .entry(principal.to_string())
            .or_insert_with(|| UserProfile::new(principal))
            .clone())
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        profile: UserProfile,
    ) -> AppResult<bool> {
        if self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(false);
        }

        let mut profiles = self.profiles.write().await;
        match profiles.get(&profile.principal) {
            Some(existing) if existing.version == expected_version => {
                profiles.insert(profile.principal.clone(), profile);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_top_by_points(&self, limit: i64) -> AppResult<Vec<UserProfile>> {
        let profiles = self.profiles.read().await;
        let mut items: Vec<UserProfile> = profiles.values().cloned().collect();
        items.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.principal.cmp(&b.principal))
        });
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.profiles.read().await.len() as u64)
    }

    async fn badge_total(&self) -> AppResult<u64> {
        let profiles = self.profiles.read().await;
        Ok(profiles.values().map(|p| p.badges.len() as u64).sum())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

struct InMemoryAttemptRepository {
    records: Arc<RwLock<HashMap<String, AttemptRecord>>>,
}

impl InMemoryAttemptRepository {
    fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn insert_if_new(&self, record: AttemptRecord) -> AppResult<bool> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.attempt_id) {
            return Ok(false);
        }
        records.insert(record.attempt_id.clone(), record);
        Ok(true)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn average_score(&self) -> AppResult<u32> {
        let records = self.records.read().await;
        if records.is_empty() {
            return Ok(0);
        }
        let sum: u64 = records.values().map(|r| r.score_percent as u64).sum();
        Ok((sum as f64 / records.len() as f64).round() as u32)
    }

    async fn best_scores_for_topic(
        &self,
        topic: &str,
        limit: i64,
    ) -> AppResult<Vec<(String, u32)>> {
        let records = self.records.read().await;
        let mut best: HashMap<String, u32> = HashMap::new();
        for record in records.values().filter(|r| r.topic == topic) {
            let entry = best.entry(record.principal.clone()).or_insert(0);
            *entry = (*entry).max(record.score_percent);
        }

        let mut entries: Vec<(String, u32)> = best.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

fn service() -> ProfileService {
    ProfileService::new(
        Arc::new(InMemoryProfileRepository::new()),
        Arc::new(InMemoryAttemptRepository::new()),
    )
}

fn result(topic: &str, correct: u32, total: u32) -> AttemptResult {
    AttemptResult::new(topic, Difficulty::Medium, correct, total)
}

// --- repository contract ---

#[tokio::test]
async fn get_or_create_returns_a_default_profile_once() {
    let repo = InMemoryProfileRepository::new();

    let first = repo.get_or_create("p").await.unwrap();
    assert_eq!(first.total_quizzes, 0);
    assert_eq!(first.version, 0);

    let again = repo.get_or_create("p").await.unwrap();
    assert_eq!(first, again);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn compare_and_swap_rejects_a_stale_version() {
    let repo = InMemoryProfileRepository::new();
    let current = repo.get_or_create("p").await.unwrap();

    let mut updated = current.clone();
    updated.total_points = 50;
    updated.version = current.version + 1;

    assert!(repo
        .compare_and_swap(current.version, updated.clone())
        .await
        .unwrap());

    // replaying the same swap must now fail: the stored version moved on
    assert!(!repo.compare_and_swap(current.version, updated).await.unwrap());
}

#[tokio::test]
async fn insert_if_new_dedups_attempt_ids() {
    let repo = InMemoryAttemptRepository::new();
    let record = AttemptRecord::from_result("attempt-1", "p", &result("python", 3, 5), chrono::Utc::now());

    assert!(repo.insert_if_new(record.clone()).await.unwrap());
    assert!(!repo.insert_if_new(record).await.unwrap());
    assert_eq!(repo.count().await.unwrap(), 1);
}

// --- profile service over the in-memory store ---

#[tokio::test]
async fn recording_an_attempt_updates_the_profile() {
    let service = service();

    let recorded = service
        .record_attempt("p", result("python", 4, 5), Some("a-1".to_string()))
        .await
        .unwrap();

    assert!(!recorded.already_recorded);
    let profile = recorded.profile;
    assert_eq!(profile.total_quizzes, 1);
    assert_eq!(profile.correct_answers, 4);
    assert_eq!(profile.topic_scores["python"], 80);
    assert_eq!(profile.streak, 1);
    assert_eq!(profile.total_points, 40);
    assert_eq!(profile.version, 1);
    assert!(profile.has_badge("first-steps"));
}

#[tokio::test]
async fn resubmitting_an_attempt_id_changes_nothing() {
    let service = service();

    let first = service
        .record_attempt("p", result("python", 5, 5), Some("a-1".to_string()))
        .await
        .unwrap();
    assert!(!first.already_recorded);

    let replay = service
        .record_attempt("p", result("python", 5, 5), Some("a-1".to_string()))
        .await
        .unwrap();

    assert!(replay.already_recorded);
    assert!(replay.new_badges.is_empty());
    assert_eq!(replay.profile.total_quizzes, 1);
    assert_eq!(
        replay
            .profile
            .badges
            .iter()
            .filter(|b| b.id == "perfectionist")
            .count(),
        1
    );
}

#[tokio::test]
async fn version_races_are_retried() {
    let profiles = Arc::new(InMemoryProfileRepository::with_forced_conflicts(2));
    let service = ProfileService::new(profiles, Arc::new(InMemoryAttemptRepository::new()));

    let recorded = service
        .record_attempt("p", result("python", 3, 5), None)
        .await
        .unwrap();

    assert_eq!(recorded.profile.total_quizzes, 1);
}

#[tokio::test]
async fn sustained_contention_surfaces_a_database_error() {
    let profiles = Arc::new(InMemoryProfileRepository::with_forced_conflicts(100));
    let service = ProfileService::new(profiles, Arc::new(InMemoryAttemptRepository::new()));

    let err = service
        .record_attempt("p", result("python", 3, 5), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DatabaseError(_)));
}

#[tokio::test]
async fn impossible_counts_are_rejected() {
    let err = service()
        .record_attempt("p", result("python", 6, 5), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn leaderboard_ranks_by_total_points() {
    let service = service();

    service
        .record_attempt("alice", result("python", 5, 5), None)
        .await
        .unwrap();
    service
        .record_attempt("bob", result("python", 2, 5), None)
        .await
        .unwrap();
    service
        .record_attempt("carol", result("python", 4, 5), None)
        .await
        .unwrap();

    let entries = service.leaderboard(10).await.unwrap();
    let order: Vec<&str> = entries.iter().map(|e| e.principal.as_str()).collect();

    assert_eq!(order, vec!["alice", "carol", "bob"]);
    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[0].total_points, 75);
}

#[tokio::test]
async fn topic_leaderboard_keeps_each_principal_best_score() {
    let service = service();

    service
        .record_attempt("alice", result("python", 2, 5), None)
        .await
        .unwrap();
    service
        .record_attempt("alice", result("python", 5, 5), None)
        .await
        .unwrap();
    service
        .record_attempt("bob", result("python", 3, 5), None)
        .await
        .unwrap();
    service
        .record_attempt("bob", result("ai", 5, 5), None)
        .await
        .unwrap();

    let entries = service.topic_leaderboard("python", 10).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].principal, "alice");
    assert_eq!(entries[0].score_percent, 100);
    assert_eq!(entries[1].principal, "bob");
    assert_eq!(entries[1].score_percent, 60);
}

#[tokio::test]
async fn stats_aggregate_across_principals() {
    let service = service();

    service
        .record_attempt("alice", result("python", 5, 5), None)
        .await
        .unwrap();
    service
        .record_attempt("bob", result("ai", 2, 5), None)
        .await
        .unwrap();

    let stats = service.stats().await.unwrap();

    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_quizzes, 2);
    // (100 + 40) / 2
    assert_eq!(stats.avg_score, 70);
    assert!(stats.total_badges_awarded >= 2);
}
