//! Shared fixtures: a data-access service over the in-memory backend.
#![allow(dead_code)]

use std::sync::Arc;

use lumina::application::DataService;
use lumina::cache::EntityCache;
use lumina::config::CoreConfig;
use lumina::domain::{ImageRecord, UserRecord, Visibility};
use lumina::infra::MemoryStore;

/// A service over a fresh in-memory store with default settings.
pub fn service() -> (DataService, Arc<MemoryStore>) {
    service_with(CoreConfig::default(), 0)
}

/// A service over a fresh store that keeps newly created tables in the
/// `Creating` state for `activation_polls` describe calls.
pub fn service_with(config: CoreConfig, activation_polls: u32) -> (DataService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(&config.tables).with_activation_polls(activation_polls));
    let cache = Arc::new(EntityCache::new(&config.cache));
    let service = DataService::new(store.clone(), cache, Arc::new(config));
    (service, store)
}

pub fn user(email: &str) -> UserRecord {
    UserRecord::new(email, "Ada", "Lovelace")
}

pub fn image(owner: &str, title: &str, tags: &[&str], visibility: Visibility) -> ImageRecord {
    ImageRecord::new(
        owner,
        title,
        "",
        tags.iter().map(|t| t.to_string()).collect(),
        visibility,
        "Ada",
    )
}
