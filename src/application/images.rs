//! Image persistence, tag-index maintenance, and derived queries.

use std::collections::HashSet;

use serde_json::json;
use tracing::info;

use crate::domain::{ImageRecord, TagIndexEntry, normalize_query, normalize_tag};
use crate::infra::{ItemKey, ScanCondition, from_document, to_document};

use super::{DataService, ServiceError};

/// Free-text search returns at most this many images.
const TEXT_SEARCH_LIMIT: usize = 50;

impl DataService {
    /// Persist an image, then write one tag-index entry per case-folded tag
    /// carrying a snapshot of owner, visibility and creation time.
    ///
    /// Re-saving overwrites existing entries, so the operation is idempotent
    /// per tag. Entries written earlier are never refreshed by later image
    /// edits; tag search serves whatever snapshot the last save left behind.
    pub async fn save_image_with_tags(&self, image: &ImageRecord) -> Result<(), ServiceError> {
        self.store()
            .put_item(&self.tables().images, to_document(image)?)
            .await?;

        for tag in &image.tags {
            let entry = TagIndexEntry::snapshot(image, tag);
            self.store()
                .put_item(&self.tables().tag_index, to_document(&entry)?)
                .await?;
        }
        info!(image_id = %image.id, tags = image.tags.len(), "image saved");
        Ok(())
    }

    pub async fn get_image_by_id(&self, id: &str) -> Result<Option<ImageRecord>, ServiceError> {
        if let Some(image) = self.cache().get_image(id) {
            return Ok(Some(image));
        }
        let doc = self
            .store()
            .get_item(&self.tables().images, &ItemKey::hash(id))
            .await?;
        let Some(doc) = doc else {
            return Ok(None);
        };
        let image: ImageRecord = from_document(doc)?;
        self.cache().put_image(image.clone());
        Ok(Some(image))
    }

    /// Images whose tag-index snapshot is public, keyed by the folded tag.
    ///
    /// The cached list is not invalidated when new images are tagged; callers
    /// observe staleness up to the TTL.
    pub async fn search_images_by_tag(&self, tag: &str) -> Result<Vec<ImageRecord>, ServiceError> {
        let tag = normalize_tag(tag);
        if tag.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(images) = self.cache().get_images_by_tag(&tag) {
            return Ok(images);
        }

        let entries = self.store().query(&self.tables().tag_index, &tag).await?;
        let mut ids = Vec::with_capacity(entries.len());
        for doc in entries {
            let entry: TagIndexEntry = from_document(doc)?;
            if entry.visibility.is_public() {
                ids.push(entry.image_id);
            }
        }

        let images = self.fetch_images(&ids).await?;
        if !images.is_empty() {
            self.cache().set_images_by_tag(tag, images.clone());
        }
        Ok(images)
    }

    /// Substring search over title, description and tags.
    ///
    /// The backend has no full-text index, so this scans every image, orders
    /// matches by creation time descending, and caps the result.
    pub async fn search_images_by_text(
        &self,
        query: &str,
    ) -> Result<Vec<ImageRecord>, ServiceError> {
        let query = normalize_query(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(images) = self.cache().get_images_by_text(&query) {
            return Ok(images);
        }

        let mut matches = Vec::new();
        for image in self.scan_images(&[]).await? {
            if matches_text(&image, &query) {
                matches.push(image);
            }
        }
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches.truncate(TEXT_SEARCH_LIMIT);

        if !matches.is_empty() {
            self.cache().set_images_by_text(query, matches.clone());
        }
        Ok(matches)
    }

    /// All public images, unioned with the owner's private images when an
    /// owner is given. Deduplicated by id; concatenation order only.
    pub async fn list_images_for_owner(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Vec<ImageRecord>, ServiceError> {
        let mut result = self.public_images().await?;
        let Some(owner_id) = owner_id else {
            return Ok(result);
        };

        let seen: HashSet<String> = result.iter().map(|image| image.id.clone()).collect();
        let private = self
            .scan_images(&[
                ScanCondition::eq("owner_id", owner_id),
                ScanCondition::eq("visibility", json!("private")),
            ])
            .await?;
        for image in private {
            if !seen.contains(&image.id) {
                result.push(image);
            }
        }
        Ok(result)
    }

    /// Every image uploaded by one owner, regardless of visibility.
    pub async fn list_images_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<ImageRecord>, ServiceError> {
        self.scan_images(&[ScanCondition::eq("owner_id", owner_id)])
            .await
    }

    async fn public_images(&self) -> Result<Vec<ImageRecord>, ServiceError> {
        if let Some(images) = self.cache().get_public_images() {
            return Ok(images);
        }
        let images = self
            .scan_images(&[ScanCondition::eq("visibility", json!("public"))])
            .await?;
        if !images.is_empty() {
            self.cache().set_public_images(images.clone());
        }
        Ok(images)
    }

    /// Run a filtered scan over the images table to completion.
    pub(super) async fn scan_images(
        &self,
        filter: &[ScanCondition],
    ) -> Result<Vec<ImageRecord>, ServiceError> {
        let mut images = Vec::new();
        let mut token = None;
        loop {
            let page = self
                .store()
                .scan(&self.tables().images, filter, token, None)
                .await?;
            for doc in page.items {
                images.push(from_document::<ImageRecord>(doc)?);
            }
            token = page.next;
            if token.is_none() {
                break;
            }
        }
        Ok(images)
    }
}

fn matches_text(image: &ImageRecord, query: &str) -> bool {
    image.title.to_lowercase().contains(query)
        || image.description.to_lowercase().contains(query)
        || image
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(query))
}

#[cfg(test)]
mod tests {
    use crate::domain::Visibility;

    use super::*;

    fn image_with(title: &str, description: &str, tags: &[&str]) -> ImageRecord {
        ImageRecord::new(
            "owner",
            title,
            description,
            tags.iter().map(|t| t.to_string()).collect(),
            Visibility::Public,
            "Ada",
        )
    }

    #[test]
    fn text_match_covers_title_description_and_tags() {
        let image = image_with("Golden Hour", "Dunes at dusk", &["Desert", "sand"]);
        assert!(matches_text(&image, "golden"));
        assert!(matches_text(&image, "dusk"));
        assert!(matches_text(&image, "desert"));
        assert!(!matches_text(&image, "ocean"));
    }
}
