use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::AttemptRecord,
    repositories::profile_repository::{bson_as_u64, is_duplicate_key_error},
};

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Insert the record unless its attempt id was seen before. Returns
    /// false for a duplicate, which callers treat as "already recorded".
    async fn insert_if_new(&self, record: AttemptRecord) -> AppResult<bool>;

    async fn count(&self) -> AppResult<u64>;
    async fn average_score(&self) -> AppResult<u32>;

    /// Best score per principal for a topic, highest first.
    async fn best_scores_for_topic(
        &self,
        topic: &str,
        limit: i64,
    ) -> AppResult<Vec<(String, u32)>>;

    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAttemptRepository {
    collection: Collection<AttemptRecord>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn insert_if_new(&self, record: AttemptRecord) -> AppResult<bool> {
        match self.collection.insert_one(&record).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key_error(&err) => {
                log::info!(
                    "Attempt {} for principal {} already recorded, skipping",
                    record.attempt_id,
                    record.principal
                );
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn count(&self) -> AppResult<u64> {
        let count = self.collection.count_documents(doc! {}).await?;
        Ok(count)
    }

    async fn average_score(&self) -> AppResult<u32> {
        let pipeline = vec![
            doc! { "$group": { "_id": null, "avg": { "$avg": "$score_percent" } } },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let Some(document) = cursor.try_next().await? else {
            return Ok(0);
        };

        let avg = document.get_f64("avg").unwrap_or(0.0);
        Ok(avg.round().max(0.0) as u32)
    }

    async fn best_scores_for_topic(
        &self,
        topic: &str,
        limit: i64,
    ) -> AppResult<Vec<(String, u32)>> {
        let pipeline = vec![
            doc! { "$match": { "topic": topic } },
            doc! { "$group": { "_id": "$principal", "best": { "$max": "$score_percent" } } },
            doc! { "$sort": { "best": -1, "_id": 1 } },
            doc! { "$limit": limit },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let mut entries = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            let principal = document.get_str("_id").unwrap_or_default().to_string();
            let best = bson_as_u64(document.get("best")) as u32;
            entries.push((principal, best));
        }

        Ok(entries)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let unique_attempt = IndexModel::builder()
            .keys(doc! { "attempt_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("attempt_id_unique".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(unique_attempt).await?;

        // topic leaderboards group by principal within a topic
        let topic_index = IndexModel::builder()
            .keys(doc! { "topic": 1, "principal": 1 })
            .build();
        self.collection.create_index(topic_index).await?;

        log::info!("Created indexes for attempts collection");
        Ok(())
    }
}
