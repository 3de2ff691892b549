//! Data-access service and media ingestion pipeline.
//!
//! [`DataService`] is the single mediator for entity reads and writes: it
//! reads through the entity cache on point lookups and derived query results,
//! and invalidates or rewrites cache entries on the mutations it performs.
//! [`MediaPipeline`] sits on top of it and turns one uploaded byte stream
//! into a published image with fixed-resolution variants.

mod downloads;
mod error;
mod images;
mod pipeline;
mod social;
mod users;

pub use downloads::DownloadRequest;
pub use error::ServiceError;
pub use pipeline::{ImageDraft, MediaPipeline, PublishedImage};
pub use social::{FollowOutcome, LikeOutcome};

use std::sync::Arc;

use futures::future::try_join_all;

use crate::cache::EntityCache;
use crate::config::{CoreConfig, TableSettings};
use crate::domain::ImageRecord;
use crate::infra::{EntityStore, ItemKey, from_document};

/// Mediator for all entity backend access.
#[derive(Clone)]
pub struct DataService {
    store: Arc<dyn EntityStore>,
    cache: Arc<EntityCache>,
    config: Arc<CoreConfig>,
}

impl DataService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: Arc<EntityCache>,
        config: Arc<CoreConfig>,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    fn tables(&self) -> &TableSettings {
        &self.config.tables
    }

    /// Batch-fetch images by id with concurrent point lookups. Ids that no
    /// longer resolve are skipped.
    async fn fetch_images(&self, ids: &[String]) -> Result<Vec<ImageRecord>, ServiceError> {
        let table = &self.tables().images;
        let keys: Vec<ItemKey> = ids.iter().map(|id| ItemKey::hash(id.clone())).collect();
        let docs = try_join_all(keys.iter().map(|key| self.store().get_item(table, key))).await?;

        let mut images = Vec::with_capacity(docs.len());
        for doc in docs.into_iter().flatten() {
            images.push(from_document::<ImageRecord>(doc)?);
        }
        Ok(images)
    }
}
