//! Persistent records stored in the entity backend.
//!
//! Every record serializes to a flat JSON document; timestamps travel as
//! RFC 3339 strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::types::{Visibility, normalize_tag};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// An account, including its denormalized follower counter and profile
/// sub-record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email_verified: bool,
    /// Denormalized follower counter; tracked independently of follow edges.
    #[serde(default)]
    pub followers: i64,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl UserRecord {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: new_id(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email_verified: false,
            followers: 0,
            profile: UserProfile::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public-facing profile details attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub youtube: Option<String>,
    pub pinterest: Option<String>,
    #[serde(default)]
    pub newsletter: bool,
}

/// A published photo with its variant URLs and denormalized counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Variant label (`low`/`medium`/`high`) to object URL.
    #[serde(default)]
    pub quality_urls: BTreeMap<String, String>,
    /// Canonical URL; the highest-resolution variant.
    #[serde(default)]
    pub image_url: String,
    /// Decoded width / height, rendered as a decimal string.
    #[serde(default)]
    pub aspect_ratio: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub downloads: i64,
    #[serde(default)]
    pub photographer: String,
    pub camera_model: Option<String>,
    pub aperture: Option<String>,
    pub focal: Option<String>,
    pub iso: Option<String>,
    pub location: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ImageRecord {
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        tags: Vec<String>,
        visibility: Visibility,
        photographer: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: new_id(),
            owner_id: owner_id.into(),
            title: title.into(),
            description: description.into(),
            tags,
            visibility,
            quality_urls: BTreeMap::new(),
            image_url: String::new(),
            aspect_ratio: String::new(),
            likes: 0,
            downloads: 0,
            photographer: photographer.into(),
            camera_model: None,
            aperture: None,
            focal: None,
            iso: None,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One `(tag, image)` entry in the denormalized tag index.
///
/// Owner, visibility and creation time are a snapshot taken when the image is
/// saved; later image edits do not refresh existing entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagIndexEntry {
    pub tag: String,
    pub image_id: String,
    pub owner_id: String,
    pub visibility: Visibility,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TagIndexEntry {
    /// Snapshot an image under one of its tags. The tag is case-folded here
    /// so the index key is canonical regardless of how the image spells it.
    pub fn snapshot(image: &ImageRecord, tag: &str) -> Self {
        Self {
            tag: normalize_tag(tag),
            image_id: image.id.clone(),
            owner_id: image.owner_id.clone(),
            visibility: image.visibility,
            created_at: image.created_at,
        }
    }
}

/// A like edge; its existence is the source of truth for "user liked image".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeEdge {
    pub image_id: String,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub liked_at: OffsetDateTime,
}

impl LikeEdge {
    pub fn new(image_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            user_id: user_id.into(),
            liked_at: OffsetDateTime::now_utc(),
        }
    }
}

/// A follow edge from one user to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: String,
    pub followee_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub followed_at: OffsetDateTime,
}

impl FollowEdge {
    pub fn new(follower_id: impl Into<String>, followee_id: impl Into<String>) -> Self {
        Self {
            follower_id: follower_id.into(),
            followee_id: followee_id.into(),
            followed_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Append-only analytics record for one image download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadEvent {
    pub id: String,
    pub image_id: String,
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub photographer: String,
    #[serde(default)]
    pub size_id: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl DownloadEvent {
    pub fn new(image_id: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            id: new_id(),
            image_id: image_id.into(),
            user_id,
            title: String::new(),
            image_url: String::new(),
            photographer: String::new(),
            size_id: String::new(),
            user_agent: None,
            referer: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
