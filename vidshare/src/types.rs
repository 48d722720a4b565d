use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::{errors::RepoError, id::EntityId};

/// The fixed set of collections the core knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    User,
    Video,
    Comment,
    Tweet,
    Like,
    Subscription,
    Playlist,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::User,
        EntityKind::Video,
        EntityKind::Comment,
        EntityKind::Tweet,
        EntityKind::Like,
        EntityKind::Subscription,
        EntityKind::Playlist,
    ];

    /// Collection name used in storage keys and index names.
    pub const fn collection(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Video => "videos",
            EntityKind::Comment => "comments",
            EntityKind::Tweet => "tweets",
            EntityKind::Like => "likes",
            EntityKind::Subscription => "subscriptions",
            EntityKind::Playlist => "playlists",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Video => "video",
            EntityKind::Comment => "comment",
            EntityKind::Tweet => "tweet",
            EntityKind::Like => "like",
            EntityKind::Subscription => "subscription",
            EntityKind::Playlist => "playlist",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Resolved sort: the document field to order by and the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub order: SortOrder,
}

impl SortSpec {
    pub const fn new(field: &'static str, order: SortOrder) -> Self {
        Self { field, order }
    }
}

/// A sort key a listing accepts. `name` is what callers send as `sortBy`,
/// `path` is the document field actually sorted on.
#[derive(Debug, Clone, Copy)]
pub struct SortField {
    pub name: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFieldType {
    Tag,
    Text,
    Numeric,
}

/// One field of a collection's search index. The alias is always the
/// document field name so filters read the same against every backend.
#[derive(Debug, Clone, Copy)]
pub struct IndexField {
    pub field: &'static str,
    pub field_type: IndexFieldType,
    pub sortable: bool,
}

impl IndexField {
    pub const fn tag(field: &'static str) -> Self {
        Self {
            field,
            field_type: IndexFieldType::Tag,
            sortable: false,
        }
    }

    pub const fn text(field: &'static str) -> Self {
        Self {
            field,
            field_type: IndexFieldType::Text,
            sortable: false,
        }
    }

    pub const fn numeric(field: &'static str) -> Self {
        Self {
            field,
            field_type: IndexFieldType::Numeric,
            sortable: false,
        }
    }

    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// JSONPath of the indexed value.
    pub fn path(&self) -> String {
        format!("$.{}", self.field)
    }
}

/// Describes a unique constraint on one or more top-level document fields.
#[derive(Debug, Clone, Copy)]
pub struct UniqueConstraint {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    /// Whether string comparisons ignore ASCII case
    pub case_insensitive: bool,
}

/// A concrete claim under a [`UniqueConstraint`], e.g. `like:<user>|video|<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub constraint: &'static str,
    pub value: String,
}

impl UniqueKey {
    /// Extract the claim a document makes under `constraint`.
    pub fn from_document(constraint: &UniqueConstraint, document: &Value) -> Result<Self, RepoError> {
        let mut parts = Vec::with_capacity(constraint.fields.len());
        for field in constraint.fields {
            let part = match document.get(*field) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => {
                    return Err(RepoError::other(format!(
                        "unique constraint `{}` requires field `{field}`",
                        constraint.name
                    )));
                }
                Some(other) => other.to_string(),
            };
            parts.push(if constraint.case_insensitive {
                part.to_ascii_lowercase()
            } else {
                part
            });
        }
        Ok(Self {
            constraint: constraint.name,
            value: parts.join("|"),
        })
    }
}

/// Trait implemented by every stored entity.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;

    /// Datetime fields that get an epoch-millisecond `<field>Ts` mirror.
    fn datetime_fields() -> &'static [&'static str] {
        &["createdAt"]
    }

    fn unique_constraints() -> &'static [UniqueConstraint] {
        &[]
    }

    /// Fields exposed to filters and sorting.
    fn index_schema() -> &'static [IndexField];

    /// Serialize into the stored document shape, mirrors included.
    fn to_document(&self) -> Result<Value, RepoError> {
        let mut document = serde_json::to_value(self)?;
        let Value::Object(map) = &mut document else {
            return Err(RepoError::other(format!("{} did not serialize to an object", Self::KIND)));
        };
        insert_datetime_mirrors(map, Self::datetime_fields());
        Ok(document)
    }

    fn from_document(document: Value) -> Result<Self, RepoError> {
        serde_json::from_value(document).map_err(|err| {
            RepoError::other(format!("failed to deserialize {}: {err}", Self::KIND))
        })
    }

    fn unique_keys(&self) -> Result<Vec<UniqueKey>, RepoError> {
        let document = self.to_document()?;
        Self::unique_constraints()
            .iter()
            .map(|constraint| UniqueKey::from_document(constraint, &document))
            .collect()
    }
}

/// Name of the numeric mirror written next to a datetime field.
pub fn mirror_field(field: &str) -> String {
    format!("{field}Ts")
}

fn insert_datetime_mirrors(map: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        let millis = map
            .get(*field)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc).timestamp_millis());
        if let Some(millis) = millis {
            map.insert(mirror_field(field), Value::from(millis));
        }
    }
}
