//! Typed per-entity cache registry.

use crate::config::CacheSettings;
use crate::domain::{ImageRecord, UserRecord};

use super::store::{TtlCache, TtlSlot};

/// One TTL cache per key family the data-access service reads through.
///
/// The registry never talks to the backend and does not know which keys are
/// related; the service invalidates every derived key a write can affect.
pub struct EntityCache {
    users_by_id: TtlCache<String, UserRecord>,
    users_by_email: TtlCache<String, UserRecord>,
    all_users: TtlSlot<Vec<UserRecord>>,
    images_by_id: TtlCache<String, ImageRecord>,
    images_by_tag: TtlCache<String, Vec<ImageRecord>>,
    images_by_text: TtlCache<String, Vec<ImageRecord>>,
    liked_by_user: TtlCache<String, Vec<ImageRecord>>,
    public_images: TtlSlot<Vec<ImageRecord>>,
}

impl EntityCache {
    pub fn new(settings: &CacheSettings) -> Self {
        let ttl = settings.ttl();
        Self {
            users_by_id: TtlCache::new("users_by_id", ttl),
            users_by_email: TtlCache::new("users_by_email", ttl),
            all_users: TtlSlot::new("all_users", ttl),
            images_by_id: TtlCache::new("images_by_id", ttl),
            images_by_tag: TtlCache::new("images_by_tag", ttl),
            images_by_text: TtlCache::new("images_by_text", ttl),
            liked_by_user: TtlCache::new("liked_by_user", ttl),
            public_images: TtlSlot::new("public_images", ttl),
        }
    }

    // Users

    pub fn get_user_by_id(&self, id: &str) -> Option<UserRecord> {
        self.users_by_id.get(&id.to_string())
    }

    pub fn set_user_by_id(&self, user: UserRecord) {
        self.users_by_id.update(user.id.clone(), user);
    }

    pub fn get_user_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users_by_email.get(&email.to_string())
    }

    pub fn set_user_by_email(&self, user: UserRecord) {
        self.users_by_email.update(user.email.clone(), user);
    }

    /// Drop every cache entry a user write can affect: the id-keyed entry,
    /// the email-keyed entry when the email is known, and the all-users
    /// aggregate.
    pub fn invalidate_user(&self, id: &str, email: Option<&str>) {
        self.users_by_id.remove(&id.to_string());
        if let Some(email) = email {
            self.users_by_email.remove(&email.to_string());
        }
        self.all_users.invalidate();
    }

    pub fn get_all_users(&self) -> Option<Vec<UserRecord>> {
        self.all_users.get()
    }

    pub fn set_all_users(&self, users: Vec<UserRecord>) {
        self.all_users.set(users);
    }

    // Images

    pub fn get_image(&self, id: &str) -> Option<ImageRecord> {
        self.images_by_id.get(&id.to_string())
    }

    /// Write an image through to its point-lookup entry in place.
    pub fn put_image(&self, image: ImageRecord) {
        self.images_by_id.update(image.id.clone(), image);
    }

    pub fn get_images_by_tag(&self, tag: &str) -> Option<Vec<ImageRecord>> {
        self.images_by_tag.get(&tag.to_string())
    }

    pub fn set_images_by_tag(&self, tag: String, images: Vec<ImageRecord>) {
        self.images_by_tag.set(tag, images);
    }

    pub fn get_images_by_text(&self, query: &str) -> Option<Vec<ImageRecord>> {
        self.images_by_text.get(&query.to_string())
    }

    pub fn set_images_by_text(&self, query: String, images: Vec<ImageRecord>) {
        self.images_by_text.set(query, images);
    }

    pub fn get_public_images(&self) -> Option<Vec<ImageRecord>> {
        self.public_images.get()
    }

    pub fn set_public_images(&self, images: Vec<ImageRecord>) {
        self.public_images.set(images);
    }

    // Engagement

    pub fn get_liked_by_user(&self, user_id: &str) -> Option<Vec<ImageRecord>> {
        self.liked_by_user.get(&user_id.to_string())
    }

    pub fn set_liked_by_user(&self, user_id: String, images: Vec<ImageRecord>) {
        self.liked_by_user.set(user_id, images);
    }

    pub fn invalidate_liked(&self, user_id: &str) {
        self.liked_by_user.remove(&user_id.to_string());
    }

    /// Clear all cached data.
    pub fn clear(&self) {
        self.users_by_id.clear();
        self.users_by_email.clear();
        self.all_users.invalidate();
        self.images_by_id.clear();
        self.images_by_tag.clear();
        self.images_by_text.clear();
        self.liked_by_user.clear();
        self.public_images.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::Visibility;

    use super::*;

    fn cache() -> EntityCache {
        EntityCache::new(&CacheSettings::default())
    }

    #[test]
    fn user_invalidation_drops_id_email_and_aggregate_entries() {
        let cache = cache();
        let user = UserRecord::new("ada@example.com", "Ada", "L");

        cache.set_user_by_id(user.clone());
        cache.set_user_by_email(user.clone());
        cache.set_all_users(vec![user.clone()]);

        cache.invalidate_user(&user.id, Some(&user.email));

        assert!(cache.get_user_by_id(&user.id).is_none());
        assert!(cache.get_user_by_email(&user.email).is_none());
        assert!(cache.get_all_users().is_none());
    }

    #[test]
    fn put_image_replaces_point_lookup_entry() {
        let cache = cache();
        let mut image =
            ImageRecord::new("owner", "Title", "", vec![], Visibility::Public, "Ada");
        cache.put_image(image.clone());

        image.likes = 5;
        cache.put_image(image.clone());

        let cached = cache.get_image(&image.id).expect("cached image");
        assert_eq!(cached.likes, 5);
    }

    #[test]
    fn clear_empties_every_family() {
        let cache = cache();
        cache.set_images_by_tag("lion".to_string(), vec![]);
        cache.set_images_by_text("sunset".to_string(), vec![]);
        cache.set_public_images(vec![]);
        cache.clear();
        assert!(cache.get_images_by_tag("lion").is_none());
        assert!(cache.get_images_by_text("sunset").is_none());
        assert!(cache.get_public_images().is_none());
    }
}
