use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    models::dto::response::DashboardUpdate,
    repositories::{
        AttemptRepository, MongoAttemptRepository, MongoProfileRepository, ProfileRepository,
    },
    services::{ModelService, ProfileService, SessionService},
};

const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub model_service: Arc<ModelService>,
    pub session_service: Arc<SessionService>,
    pub profile_service: Arc<ProfileService>,
    pub updates: broadcast::Sender<DashboardUpdate>,
    pub db: Database,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let profile_repository =
            Arc::new(MongoProfileRepository::new(&db, &config.profiles_collection));
        profile_repository.ensure_indexes().await?;

        let attempt_repository =
            Arc::new(MongoAttemptRepository::new(&db, &config.attempts_collection));
        attempt_repository.ensure_indexes().await?;

        let model_service = Arc::new(ModelService::new(&config));
        let session_service = Arc::new(SessionService::new(model_service.clone()));
        let profile_service = Arc::new(ProfileService::new(profile_repository, attempt_repository));

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Ok(Self {
            model_service,
            session_service,
            profile_service,
            updates,
            db,
            config: Arc::new(config),
        })
    }

    /// Push an event to every dashboard subscriber. Nobody listening is not
    /// an error.
    pub fn broadcast(&self, update: DashboardUpdate) {
        let _ = self.updates.send(update);
    }

    pub fn subscriber_count(&self) -> usize {
        self.updates.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
