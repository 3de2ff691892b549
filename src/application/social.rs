//! Like and follow edges plus their denormalized counters.
//!
//! Counters are updated read-then-write with no cross-request locking, so
//! under contention they can drift from the true edge count; the edges
//! themselves remain the source of truth.

use time::OffsetDateTime;
use tracing::info;

use crate::domain::{FollowEdge, ImageRecord, LikeEdge, UserRecord};
use crate::infra::{ItemKey, ScanCondition, from_document, to_document};

use super::{DataService, ServiceError};

const LIKES_USER_INDEX: &str = "user_id-index";

/// Result of one like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes: i64,
}

/// Result of one follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowOutcome {
    pub following: bool,
    pub follower_count: i64,
}

impl DataService {
    /// Flip the like edge for `(user, image)` and move the image's counter in
    /// the same direction. The cached image is rewritten in place and the
    /// user's liked-list cache is dropped.
    pub async fn toggle_like(
        &self,
        user_id: &str,
        image_id: &str,
    ) -> Result<LikeOutcome, ServiceError> {
        let likes_table = &self.tables().likes;
        let key = ItemKey::composite(image_id, user_id);

        let mut image = self
            .get_image_by_id(image_id)
            .await?
            .ok_or(ServiceError::not_found("image"))?;

        let existing = self.store().get_item(likes_table, &key).await?;
        let liked = match existing {
            Some(_) => {
                self.store().delete_item(likes_table, &key).await?;
                image.likes -= 1;
                false
            }
            None => {
                let edge = LikeEdge::new(image_id, user_id);
                self.store()
                    .put_item(likes_table, to_document(&edge)?)
                    .await?;
                image.likes += 1;
                true
            }
        };

        image.updated_at = OffsetDateTime::now_utc();
        self.store()
            .put_item(&self.tables().images, to_document(&image)?)
            .await?;
        self.cache().put_image(image.clone());
        self.cache().invalidate_liked(user_id);

        info!(user_id, image_id, liked, likes = image.likes, "like toggled");
        Ok(LikeOutcome {
            liked,
            likes: image.likes,
        })
    }

    /// Images the user has liked, resolved through the user-keyed index on
    /// the likes table and cached per user.
    pub async fn images_liked_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ImageRecord>, ServiceError> {
        if let Some(images) = self.cache().get_liked_by_user(user_id) {
            return Ok(images);
        }
        let docs = self
            .store()
            .query_index(&self.tables().likes, LIKES_USER_INDEX, user_id, false, None)
            .await?;
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            let edge: LikeEdge = from_document(doc)?;
            ids.push(edge.image_id);
        }
        let images = self.fetch_images(&ids).await?;
        if !images.is_empty() {
            self.cache().set_liked_by_user(user_id.to_string(), images.clone());
        }
        Ok(images)
    }

    /// Legacy one-way follow: records the edge and bumps the follower counter
    /// on the acting user's own record, then refreshes that user's cache
    /// entry.
    pub async fn follow_user(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<(), ServiceError> {
        let mut user = self
            .get_user_by_id(follower_id)
            .await?
            .ok_or(ServiceError::not_found("user"))?;

        let edge = FollowEdge::new(follower_id, followee_id);
        self.store()
            .put_item(&self.tables().follows, to_document(&edge)?)
            .await?;

        user.followers += 1;
        user.updated_at = OffsetDateTime::now_utc();
        self.store()
            .put_item(&self.tables().users, to_document(&user)?)
            .await?;
        self.cache().set_user_by_id(user);

        info!(follower_id, followee_id, "follow recorded");
        Ok(())
    }

    /// Flip the follow edge, then recompute the followee's follower count
    /// from the edges and persist it. A self-follow is a no-op reported as
    /// not following.
    pub async fn toggle_follow(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<FollowOutcome, ServiceError> {
        if follower_id == followee_id {
            let follower_count = self.follower_count(followee_id).await?;
            return Ok(FollowOutcome {
                following: false,
                follower_count,
            });
        }

        let follows_table = &self.tables().follows;
        let existed = self.is_following(follower_id, followee_id).await?;
        if existed {
            self.store()
                .delete_item(
                    follows_table,
                    &ItemKey::composite(follower_id, followee_id),
                )
                .await?;
        } else {
            let edge = FollowEdge::new(follower_id, followee_id);
            self.store()
                .put_item(follows_table, to_document(&edge)?)
                .await?;
        }

        let follower_count = self.follower_count(followee_id).await?;
        if let Some(mut followee) = self.get_user_by_id(followee_id).await? {
            followee.followers = follower_count;
            followee.updated_at = OffsetDateTime::now_utc();
            self.store()
                .put_item(&self.tables().users, to_document(&followee)?)
                .await?;
            self.cache().set_user_by_id(followee);
        }

        info!(
            follower_id,
            followee_id,
            following = !existed,
            follower_count,
            "follow toggled"
        );
        Ok(FollowOutcome {
            following: !existed,
            follower_count,
        })
    }

    /// Whether a follow edge exists, checked via a filtered scan over the
    /// edges matching both ids.
    pub async fn is_following(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, ServiceError> {
        let edges = self
            .scan_follows(&[
                ScanCondition::eq("follower_id", follower_id),
                ScanCondition::eq("followee_id", followee_id),
            ])
            .await?;
        Ok(!edges.is_empty())
    }

    /// Follower count recomputed from the edges via a filtered scan.
    pub async fn follower_count(&self, user_id: &str) -> Result<i64, ServiceError> {
        let edges = self
            .scan_follows(&[ScanCondition::eq("followee_id", user_id)])
            .await?;
        Ok(edges.len() as i64)
    }

    pub async fn list_followers(&self, user_id: &str) -> Result<Vec<FollowEdge>, ServiceError> {
        self.scan_follows(&[ScanCondition::eq("followee_id", user_id)])
            .await
    }

    /// Everyone the user follows; a hash-key query since the edge table is
    /// keyed by follower.
    pub async fn list_following(&self, user_id: &str) -> Result<Vec<FollowEdge>, ServiceError> {
        let docs = self.store().query(&self.tables().follows, user_id).await?;
        let mut edges = Vec::with_capacity(docs.len());
        for doc in docs {
            edges.push(from_document::<FollowEdge>(doc)?);
        }
        Ok(edges)
    }

    /// Convenience over [`DataService::get_user_by_id`] for callers that only
    /// need the denormalized counter on the record itself.
    pub async fn stored_follower_count(&self, user_id: &str) -> Result<i64, ServiceError> {
        Ok(self
            .get_user_by_id(user_id)
            .await?
            .map(|user: UserRecord| user.followers)
            .unwrap_or(0))
    }

    async fn scan_follows(
        &self,
        filter: &[ScanCondition],
    ) -> Result<Vec<FollowEdge>, ServiceError> {
        let mut edges = Vec::new();
        let mut token = None;
        loop {
            let page = self
                .store()
                .scan(&self.tables().follows, filter, token, None)
                .await?;
            for doc in page.items {
                edges.push(from_document::<FollowEdge>(doc)?);
            }
            token = page.next;
            if token.is_none() {
                break;
            }
        }
        Ok(edges)
    }
}
