//! Stored entities.
//!
//! Field names are camelCase in the stored documents. Every entity carries a
//! `createdAt` timestamp which the store mirrors as `createdAtTs` for sorting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::RepoError,
    id::EntityId,
    types::{Entity, EntityKind, IndexField, UniqueConstraint},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn unique_constraints() -> &'static [UniqueConstraint] {
        &[UniqueConstraint {
            name: "username",
            fields: &["username"],
            case_insensitive: true,
        }]
    }

    fn index_schema() -> &'static [IndexField] {
        const SCHEMA: &[IndexField] = &[
            IndexField::tag("username").sortable(),
            IndexField::numeric("createdAtTs").sortable(),
        ];
        SCHEMA
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub views: u64,
    #[serde(default = "published_by_default")]
    pub is_published: bool,
    pub owner: EntityId,
    pub created_at: DateTime<Utc>,
}

fn published_by_default() -> bool {
    true
}

impl Entity for Video {
    const KIND: EntityKind = EntityKind::Video;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn index_schema() -> &'static [IndexField] {
        const SCHEMA: &[IndexField] = &[
            IndexField::text("title").sortable(),
            IndexField::text("description"),
            IndexField::tag("owner"),
            IndexField::numeric("duration").sortable(),
            IndexField::numeric("views").sortable(),
            IndexField::numeric("createdAtTs").sortable(),
        ];
        SCHEMA
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: EntityId,
    pub content: String,
    pub video: EntityId,
    pub owner: EntityId,
    pub created_at: DateTime<Utc>,
}

impl Entity for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn index_schema() -> &'static [IndexField] {
        const SCHEMA: &[IndexField] = &[
            IndexField::tag("video"),
            IndexField::tag("owner"),
            IndexField::numeric("createdAtTs").sortable(),
        ];
        SCHEMA
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: EntityId,
    pub content: String,
    pub owner: EntityId,
    pub created_at: DateTime<Utc>,
}

impl Entity for Tweet {
    const KIND: EntityKind = EntityKind::Tweet;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn index_schema() -> &'static [IndexField] {
        const SCHEMA: &[IndexField] = &[IndexField::tag("owner"), IndexField::numeric("createdAtTs").sortable()];
        SCHEMA
    }
}

/// What a [`Like`] points at. Exactly one target per like.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Video(EntityId),
    Comment(EntityId),
    Tweet(EntityId),
}

impl LikeTarget {
    pub fn kind(&self) -> EntityKind {
        match self {
            LikeTarget::Video(_) => EntityKind::Video,
            LikeTarget::Comment(_) => EntityKind::Comment,
            LikeTarget::Tweet(_) => EntityKind::Tweet,
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => id,
        }
    }

    fn from_parts(kind: &str, id: EntityId) -> Result<Self, RepoError> {
        match kind {
            "video" => Ok(LikeTarget::Video(id)),
            "comment" => Ok(LikeTarget::Comment(id)),
            "tweet" => Ok(LikeTarget::Tweet(id)),
            other => Err(RepoError::invalid("targetKind", format!("cannot like a `{other}`"))),
        }
    }
}

/// At most one like per (user, target).
pub const LIKER_TARGET: UniqueConstraint = UniqueConstraint {
    name: "liker_target",
    fields: &["likedBy", "targetKind", "targetId"],
    case_insensitive: false,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "LikeRecord", try_from = "LikeRecord")]
pub struct Like {
    pub id: EntityId,
    pub liked_by: EntityId,
    pub target: LikeTarget,
    pub created_at: DateTime<Utc>,
}

/// Flat stored shape of a [`Like`], so the target can be indexed and constrained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikeRecord {
    id: EntityId,
    liked_by: EntityId,
    target_kind: String,
    target_id: EntityId,
    created_at: DateTime<Utc>,
}

impl From<Like> for LikeRecord {
    fn from(like: Like) -> Self {
        let target_kind = like.target.kind().name().to_string();
        let target_id = like.target.id().clone();
        Self {
            id: like.id,
            liked_by: like.liked_by,
            target_kind,
            target_id,
            created_at: like.created_at,
        }
    }
}

impl TryFrom<LikeRecord> for Like {
    type Error = RepoError;

    fn try_from(record: LikeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            target: LikeTarget::from_parts(&record.target_kind, record.target_id)?,
            id: record.id,
            liked_by: record.liked_by,
            created_at: record.created_at,
        })
    }
}

impl Entity for Like {
    const KIND: EntityKind = EntityKind::Like;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn unique_constraints() -> &'static [UniqueConstraint] {
        &[LIKER_TARGET]
    }

    fn index_schema() -> &'static [IndexField] {
        const SCHEMA: &[IndexField] = &[
            IndexField::tag("likedBy"),
            IndexField::tag("targetKind"),
            IndexField::tag("targetId"),
            IndexField::numeric("createdAtTs").sortable(),
        ];
        SCHEMA
    }
}

/// At most one subscription per (channel, subscriber).
pub const CHANNEL_SUBSCRIBER: UniqueConstraint = UniqueConstraint {
    name: "channel_subscriber",
    fields: &["channel", "subscriber"],
    case_insensitive: false,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: EntityId,
    pub channel: EntityId,
    pub subscriber: EntityId,
    pub created_at: DateTime<Utc>,
}

impl Entity for Subscription {
    const KIND: EntityKind = EntityKind::Subscription;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn unique_constraints() -> &'static [UniqueConstraint] {
        &[CHANNEL_SUBSCRIBER]
    }

    fn index_schema() -> &'static [IndexField] {
        const SCHEMA: &[IndexField] = &[
            IndexField::tag("channel"),
            IndexField::tag("subscriber"),
            IndexField::numeric("createdAtTs").sortable(),
        ];
        SCHEMA
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub owner: EntityId,
    /// Ordered, duplicate-free
    #[serde(default)]
    pub videos: Vec<EntityId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Playlist {
    const KIND: EntityKind = EntityKind::Playlist;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn index_schema() -> &'static [IndexField] {
        const SCHEMA: &[IndexField] = &[
            IndexField::text("name").sortable(),
            IndexField::tag("owner"),
            IndexField::numeric("createdAtTs").sortable(),
        ];
        SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn id(seed: char) -> EntityId {
        EntityId::try_from(seed.to_string().repeat(20)).unwrap()
    }

    #[test]
    fn like_is_stored_flat() {
        let like = Like {
            id: id('A'),
            liked_by: id('B'),
            target: LikeTarget::Comment(id('C')),
            created_at: Utc::now(),
        };
        let doc = like.to_document().unwrap();
        assert_eq!(doc["likedBy"], json!("B".repeat(20)));
        assert_eq!(doc["targetKind"], json!("comment"));
        assert_eq!(doc["targetId"], json!("C".repeat(20)));
        assert!(doc.get("target").is_none());
        assert!(doc["createdAtTs"].is_i64());

        let back = Like::from_document(doc).unwrap();
        assert_eq!(back, like);
    }

    #[test]
    fn unknown_like_target_kind_is_rejected() {
        let doc = json!({
            "id": "A".repeat(20),
            "likedBy": "B".repeat(20),
            "targetKind": "playlist",
            "targetId": "C".repeat(20),
            "createdAt": "2024-01-01T00:00:00Z",
        });
        assert!(Like::from_document(doc).is_err());
    }

    #[test]
    fn video_defaults_apply_on_sparse_documents() {
        let doc = json!({
            "id": "A".repeat(20),
            "title": "t",
            "description": "d",
            "videoFile": "https://cdn.example/v.mp4",
            "thumbnail": "https://cdn.example/t.png",
            "owner": "B".repeat(20),
            "createdAt": "2024-01-01T00:00:00Z",
        });
        let video = Video::from_document(doc).unwrap();
        assert!(video.is_published);
        assert_eq!(video.views, 0);
        assert_eq!(video.duration, 0.0);
    }

    #[test]
    fn subscription_claims_channel_subscriber_pair() {
        let sub = Subscription {
            id: id('A'),
            channel: id('B'),
            subscriber: id('C'),
            created_at: Utc::now(),
        };
        let keys = sub.unique_keys().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].value, format!("{}|{}", "B".repeat(20), "C".repeat(20)));
    }
}
