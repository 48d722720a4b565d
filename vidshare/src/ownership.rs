//! Mutations scoped to the record's owner.
//!
//! Every update and delete is one conditional store call guarded by
//! `owner == principal`. A miss is always [`RepoError::NotFoundOrNotOwned`],
//! whether the record is absent or belongs to someone else.

use crate::{
    errors::RepoError,
    id::{EntityId, Principal},
    models::{Comment, Playlist, Tweet, Video},
    patch::{Guard, Patch},
    store::EntityStore,
    types::Entity,
};

/// An entity exclusively owned by the user who created it.
pub trait Owned: Entity {
    fn owner(&self) -> &EntityId;
}

impl Owned for Video {
    fn owner(&self) -> &EntityId {
        &self.owner
    }
}

impl Owned for Comment {
    fn owner(&self) -> &EntityId {
        &self.owner
    }
}

impl Owned for Tweet {
    fn owner(&self) -> &EntityId {
        &self.owner
    }
}

impl Owned for Playlist {
    fn owner(&self) -> &EntityId {
        &self.owner
    }
}

#[derive(Debug, Clone)]
pub enum OwnedMutation {
    Update(Patch),
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OwnedOutcome<T> {
    Updated(T),
    Deleted,
}

pub async fn mutate_owned<S, T>(
    store: &S,
    id: &EntityId,
    principal: &Principal,
    mutation: OwnedMutation,
) -> Result<OwnedOutcome<T>, RepoError>
where
    S: EntityStore,
    T: Owned,
{
    let guard = Guard::owned_by(principal);
    let not_owned = || RepoError::NotFoundOrNotOwned { entity: T::KIND };
    match mutation {
        OwnedMutation::Update(patch) => store
            .update_where::<T>(id, &guard, &patch)
            .await?
            .map(OwnedOutcome::Updated)
            .ok_or_else(not_owned),
        OwnedMutation::Delete => {
            if store.delete_where::<T>(id, &guard).await? {
                Ok(OwnedOutcome::Deleted)
            } else {
                Err(not_owned())
            }
        }
    }
}

/// Apply `patch` if `principal` owns the record; returns the updated record.
pub async fn update_owned<S, T>(store: &S, id: &EntityId, principal: &Principal, patch: Patch) -> Result<T, RepoError>
where
    S: EntityStore,
    T: Owned,
{
    match mutate_owned::<S, T>(store, id, principal, OwnedMutation::Update(patch)).await? {
        OwnedOutcome::Updated(entity) => Ok(entity),
        OwnedOutcome::Deleted => Err(RepoError::other("update produced a delete outcome")),
    }
}

pub async fn delete_owned<S, T>(store: &S, id: &EntityId, principal: &Principal) -> Result<(), RepoError>
where
    S: EntityStore,
    T: Owned,
{
    mutate_owned::<S, T>(store, id, principal, OwnedMutation::Delete).await?;
    Ok(())
}

/// Invert a boolean field on an owned record.
///
/// Read, invert and write are separate store calls; two concurrent flips can
/// both read the same value and leave it unchanged overall.
pub async fn flip_owned_flag<S, T>(
    store: &S,
    id: &EntityId,
    principal: &Principal,
    field: &'static str,
    read: fn(&T) -> bool,
) -> Result<T, RepoError>
where
    S: EntityStore,
    T: Owned,
{
    let current = store
        .get::<T>(id)
        .await?
        .filter(|record| record.owner() == principal.id())
        .ok_or(RepoError::NotFoundOrNotOwned { entity: T::KIND })?;
    let patch = Patch::new().assign(field, !read(&current));
    update_owned(store, id, principal, patch).await
}
