use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::UserProfile};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find(&self, principal: &str) -> AppResult<Option<UserProfile>>;

    /// Fetch the profile for a principal, creating the default one on first
    /// contact.
    async fn get_or_create(&self, principal: &str) -> AppResult<UserProfile>;

    /// Replace the stored profile only if its version still matches
    /// `expected_version`. Returns false when another writer got there
    /// first; the caller re-reads and retries.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        profile: UserProfile,
    ) -> AppResult<bool>;

    async fn list_top_by_points(&self, limit: i64) -> AppResult<Vec<UserProfile>>;
    async fn count(&self) -> AppResult<u64>;
    async fn badge_total(&self) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub(crate) fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) if write_error.code == 11000
    )
}

pub struct MongoProfileRepository {
    collection: Collection<UserProfile>,
}

impl MongoProfileRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }
}

#[async_trait]
impl ProfileRepository for MongoProfileRepository {
    async fn find(&self, principal: &str) -> AppResult<Option<UserProfile>> {
        let profile = self
            .collection
            .find_one(doc! { "principal": principal })
            .await?;
        Ok(profile)
    }

    async fn get_or_create(&self, principal: &str) -> AppResult<UserProfile> {
        if let Some(profile) = self.find(principal).await? {
            return Ok(profile);
        }

        let fresh = UserProfile::new(principal);
        match self.collection.insert_one(&fresh).await {
            Ok(_) => Ok(fresh),
            // another request created the profile between find and insert
            Err(err) if is_duplicate_key_error(&err) => {
                let existing = self.find(principal).await?;
                existing.ok_or_else(|| err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        profile: UserProfile,
    ) -> AppResult<bool> {
        let filter = doc! {
            "principal": &profile.principal,
            "version": expected_version as i64,
        };

        let result = self.collection.replace_one(filter, &profile).await?;
        Ok(result.matched_count == 1)
    }

    async fn list_top_by_points(&self, limit: i64) -> AppResult<Vec<UserProfile>> {
        let find_options = FindOptions::builder()
            .sort(doc! { "total_points": -1, "principal": 1 })
            .limit(Some(limit))
            .build();

        let cursor = self
            .collection
            .find(doc! {})
            .with_options(find_options)
            .await?;
        let profiles: Vec<UserProfile> = cursor.try_collect().await?;
        Ok(profiles)
    }

    async fn count(&self) -> AppResult<u64> {
        let count = self.collection.count_documents(doc! {}).await?;
        Ok(count)
    }

    async fn badge_total(&self) -> AppResult<u64> {
        let pipeline = vec![
            doc! { "$project": { "badge_count": { "$size": "$badges" } } },
            doc! { "$group": { "_id": null, "total": { "$sum": "$badge_count" } } },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let Some(document) = cursor.try_next().await? else {
            return Ok(0);
        };

        Ok(bson_as_u64(document.get("total")))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let options = IndexOptions::builder()
            .unique(true)
            .name("principal_unique".to_string())
            .build();
        let model = IndexModel::builder()
            .keys(doc! { "principal": 1 })
            .options(options)
            .build();

        self.collection.create_index(model).await?;
        log::info!("Created unique index on profiles.principal");

        Ok(())
    }
}

/// Aggregation results come back as Int32 or Int64 depending on the stored
/// width; fold both to u64.
pub(crate) fn bson_as_u64(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        Some(Bson::Double(n)) => n.max(0.0) as u64,
        _ => 0,
    }
}
