//! Domain records and value types for the photo catalogue.

pub mod entities;
pub mod types;

pub use entities::{
    DownloadEvent, FollowEdge, ImageRecord, LikeEdge, TagIndexEntry, UserProfile, UserRecord,
};
pub use types::{Visibility, normalize_query, normalize_tag};
