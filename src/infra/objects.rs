//! Object storage contract and in-memory implementation.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::info;

use crate::config::MediaSettings;

use super::error::BackendError;

/// Write-only view of the media bucket: store a blob, get its public URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, BackendError>;
}

/// A blob held by [`MemoryObjectStore`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// In-memory bucket; URLs resolve as `{public_base_url}/{bucket}/{key}`.
pub struct MemoryObjectStore {
    base_url: String,
    bucket: String,
    objects: DashMap<String, StoredObject>,
}

impl MemoryObjectStore {
    pub fn new(media: &MediaSettings) -> Self {
        Self {
            base_url: media.public_base_url.trim_end_matches('/').to_string(),
            bucket: media.bucket.clone(),
            objects: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let url = format!("{}/{}/{key}", self.base_url, self.bucket);
        self.objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        info!(%url, "object stored");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stored_objects_resolve_under_the_configured_base_and_bucket() {
        let media = MediaSettings {
            bucket: "shots".to_string(),
            public_base_url: "https://media.example.com/".to_string(),
            ..MediaSettings::default()
        };
        let store = MemoryObjectStore::new(&media);
        let url = store
            .put_object("users/u1/images/a/low_Sunset", Bytes::from_static(b"jpg"), "image/jpeg")
            .await
            .expect("put");
        assert_eq!(
            url,
            "https://media.example.com/shots/users/u1/images/a/low_Sunset"
        );

        let stored = store.get("users/u1/images/a/low_Sunset").expect("stored");
        assert_eq!(stored.content_type, "image/jpeg");
        assert_eq!(store.len(), 1);
    }
}
