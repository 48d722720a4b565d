//! Attach a projected view of a referenced entity to result rows.

use std::collections::{HashMap, HashSet};

use serde::{Serialize, Serializer, ser::Error as _};
use serde_json::Value;

use crate::{
    errors::RepoError,
    id::EntityId,
    models::User,
    store::EntityStore,
    types::Entity,
};

/// A fixed subset of an entity's fields, embedded in place of a reference.
pub trait Projection: Serialize + Clone + Send + Sync {
    type Source: Entity;

    fn project(source: &Self::Source) -> Self;
}

/// Public profile of a user, as embedded in listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    pub id: EntityId,
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
}

impl Projection for OwnerProfile {
    type Source = User;

    fn project(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Which field of a row holds the reference, and how to read it.
pub struct JoinSpec<T> {
    pub field: &'static str,
    pub reference: fn(&T) -> &EntityId,
}

impl<T> Clone for JoinSpec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JoinSpec<T> {}

impl<T> JoinSpec<T> {
    pub const fn new(field: &'static str, reference: fn(&T) -> &EntityId) -> Self {
        Self { field, reference }
    }
}

/// A row with its reference resolved. Serializes as the row with the
/// reference field replaced by the projection, or `null` if it dangles.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<T, P> {
    pub row: T,
    pub joined: Option<P>,
    field: &'static str,
}

impl<T, P> Joined<T, P> {
    pub fn new(row: T, field: &'static str, joined: Option<P>) -> Self {
        Self { row, joined, field }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl<T: Serialize, P: Serialize> Serialize for Joined<T, P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.row).map_err(S::Error::custom)?;
        let Value::Object(map) = &mut value else {
            return Err(S::Error::custom("joined row must serialize to an object"));
        };
        let embedded = match &self.joined {
            Some(projection) => serde_json::to_value(projection).map_err(S::Error::custom)?,
            None => Value::Null,
        };
        map.insert(self.field.to_string(), embedded);
        value.serialize(serializer)
    }
}

/// Resolve `join` for every row with a single batched lookup.
pub async fn attach<S, T, P>(store: &S, rows: Vec<T>, join: JoinSpec<T>) -> Result<Vec<Joined<T, P>>, RepoError>
where
    S: EntityStore,
    P: Projection,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<EntityId> = {
        let mut seen = HashSet::new();
        rows.iter()
            .map(|row| (join.reference)(row))
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect()
    };

    let sources: Vec<P::Source> = store.get_many(&ids).await?;
    let projected: HashMap<EntityId, P> = sources
        .iter()
        .map(|source| (source.id().clone(), P::project(source)))
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let joined = projected.get((join.reference)(&row)).cloned();
            Joined::new(row, join.field, joined)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::{models::Tweet, store::MemoryStore};

    fn user(name: &str) -> User {
        User {
            id: EntityId::generate(),
            username: name.to_string(),
            full_name: format!("{name} full"),
            avatar: Some(format!("https://cdn.example/{name}.png")),
            created_at: Utc::now(),
        }
    }

    fn tweet(owner: &EntityId) -> Tweet {
        Tweet {
            id: EntityId::generate(),
            content: "hello".to_string(),
            owner: owner.clone(),
            created_at: Utc::now(),
        }
    }

    fn tweet_owner(tweet: &Tweet) -> &EntityId {
        &tweet.owner
    }

    const TWEET_OWNER: JoinSpec<Tweet> = JoinSpec::new("owner", tweet_owner);

    #[tokio::test]
    async fn replaces_reference_with_profile_or_null() {
        let store = MemoryStore::new();
        let alice = user("alice");
        store.insert(&alice).await.unwrap();

        let ghost = EntityId::generate();
        let rows = vec![tweet(&alice.id), tweet(&ghost), tweet(&alice.id)];
        let joined: Vec<Joined<Tweet, OwnerProfile>> = attach(&store, rows, TWEET_OWNER).await.unwrap();

        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].joined.as_ref().unwrap().username, "alice");
        assert!(joined[1].joined.is_none());

        let encoded = serde_json::to_value(&joined[0]).unwrap();
        assert_eq!(
            encoded["owner"],
            json!({
                "id": alice.id.as_str(),
                "username": "alice",
                "fullName": "alice full",
                "avatar": "https://cdn.example/alice.png",
            })
        );
        assert_eq!(encoded["content"], "hello");
        assert!(serde_json::to_value(&joined[1]).unwrap()["owner"].is_null());
    }

    #[tokio::test]
    async fn empty_input_needs_no_lookup() {
        let store = MemoryStore::new();
        let joined: Vec<Joined<Tweet, OwnerProfile>> = attach(&store, Vec::new(), TWEET_OWNER).await.unwrap();
        assert!(joined.is_empty());
    }

    #[tokio::test]
    async fn projection_leaves_store_untouched() {
        let store = MemoryStore::new();
        let alice = user("alice");
        store.insert(&alice).await.unwrap();
        let _: Vec<Joined<Tweet, OwnerProfile>> =
            attach(&store, vec![tweet(&alice.id)], TWEET_OWNER).await.unwrap();
        let stored: User = store.get(&alice.id).await.unwrap().unwrap();
        assert_eq!(stored, alice);
    }
}
