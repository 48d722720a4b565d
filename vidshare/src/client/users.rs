use chrono::Utc;
use log::debug;

use super::{Client, parse_id, required_text};
use crate::{
    errors::RepoError,
    id::EntityId,
    models::User,
    store::EntityStore,
    types::{Entity, EntityKind, UniqueKey},
};

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
}

impl<S: EntityStore> Client<S> {
    /// Create a user. Usernames are trimmed, lowercased and unique.
    pub async fn register_user(&self, new: NewUser) -> Result<User, RepoError> {
        let username = required_text("username", &new.username)?.to_lowercase();
        let full_name = required_text("fullName", &new.full_name)?;
        let user = User {
            id: EntityId::generate(),
            username,
            full_name,
            avatar: new.avatar.filter(|a| !a.trim().is_empty()),
            created_at: Utc::now(),
        };
        self.store.insert(&user).await?;
        debug!("registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, RepoError> {
        let id = parse_id("userId", user_id)?;
        self.store.get::<User>(&id).await?.ok_or(RepoError::NotFound {
            entity: EntityKind::User,
            entity_id: id.to_string(),
        })
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let constraint = &User::unique_constraints()[0];
        let key = UniqueKey {
            constraint: constraint.name,
            value: username.trim().to_lowercase(),
        };
        self.store.find_unique::<User>(&key).await
    }
}
