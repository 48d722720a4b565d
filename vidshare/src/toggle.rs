//! Presence/absence toggles over uniquely keyed relations.
//!
//! The store's unique constraint is what guarantees at most one record per
//! key. Racing toggles may each observe "absent"; only one insert can win and
//! the loser reports the relation as active, since it now exists.

use chrono::Utc;
use log::debug;
use serde::Serialize;

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::{
    errors::RepoError,
    id::EntityId,
    models::{CHANNEL_SUBSCRIBER, LIKER_TARGET, Like, LikeTarget, Subscription},
    patch::Guard,
    store::EntityStore,
    types::{Entity, UniqueConstraint, UniqueKey},
};

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// Whether the relation exists after the toggle
    pub active: bool,
}

/// A relation entity that is created on first toggle and deleted on the next.
pub trait ToggleRelation: Entity {
    type Key;

    /// The constraint the relation key is unique under.
    fn constraint() -> &'static UniqueConstraint;

    /// Build the record that would represent `key`. Rejects keys that can
    /// never form a relation.
    fn from_key(key: Self::Key) -> Result<Self, RepoError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeKey {
    pub liked_by: EntityId,
    pub target: LikeTarget,
}

impl ToggleRelation for Like {
    type Key = LikeKey;

    fn constraint() -> &'static UniqueConstraint {
        &LIKER_TARGET
    }

    fn from_key(key: LikeKey) -> Result<Self, RepoError> {
        Ok(Like {
            id: EntityId::generate(),
            liked_by: key.liked_by,
            target: key.target,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionKey {
    pub channel: EntityId,
    pub subscriber: EntityId,
}

impl ToggleRelation for Subscription {
    type Key = SubscriptionKey;

    fn constraint() -> &'static UniqueConstraint {
        &CHANNEL_SUBSCRIBER
    }

    fn from_key(key: SubscriptionKey) -> Result<Self, RepoError> {
        if key.channel == key.subscriber {
            return Err(RepoError::invalid("channelId", "cannot subscribe to your own channel"));
        }
        Ok(Subscription {
            id: EntityId::generate(),
            channel: key.channel,
            subscriber: key.subscriber,
            created_at: Utc::now(),
        })
    }
}

/// Flip the relation for `key`: delete it if present, create it if absent.
pub async fn toggle<S, R>(store: &S, key: R::Key) -> Result<ToggleOutcome, RepoError>
where
    S: EntityStore,
    R: ToggleRelation,
{
    let candidate = R::from_key(key)?;
    let claim = UniqueKey::from_document(R::constraint(), &candidate.to_document()?)?;

    if let Some(existing) = store.find_unique::<R>(&claim).await? {
        // A concurrent toggle may have removed it first; either way it is gone.
        store.delete_where::<R>(existing.id(), &Guard::none()).await?;
        return Ok(ToggleOutcome { active: false });
    }

    match store.insert(&candidate).await {
        Ok(()) => Ok(ToggleOutcome { active: true }),
        Err(RepoError::UniqueConstraintViolation { constraint, .. }) => {
            debug!("toggle lost insert race on {constraint}");
            Ok(ToggleOutcome { active: true })
        }
        Err(err) => Err(err),
    }
}
