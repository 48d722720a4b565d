//! Resource operations over an [`EntityStore`].
//!
//! [`Client`] is the entry point: one method per operation, grouped by
//! resource in the submodules. Ids arrive as `&str` and are validated before
//! any store call; the acting user is always an explicit [`Principal`].
//!
//! # Example
//! ```no_run
//! # async fn demo() -> Result<(), vidshare::RepoError> {
//! use vidshare::{Client, ListQuery, MemoryStore};
//!
//! let client = Client::new(MemoryStore::new());
//! let page = client.list_videos(&ListQuery::default().search("rust")).await?;
//! println!("{} of {}", page.items.len(), page.total);
//! # Ok(())
//! # }
//! ```
//!
//! [`Principal`]: crate::id::Principal

mod comments;
mod dashboard;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod users;
mod videos;

pub use dashboard::ChannelStats;
pub use playlists::{NewPlaylist, PlaylistDetail, PlaylistUpdate};
pub use subscriptions::{ChannelSubscriber, SubscribedChannel};
pub use users::NewUser;
pub use videos::{NewVideo, VideoUpdate};

use crate::{
    config::{ListingSettings, VidshareConfig},
    errors::RepoError,
    id::EntityId,
    store::{AnyStore, EntityStore, RedisStore},
};

/// Operation facade over a store.
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct Client<S = AnyStore> {
    store: S,
    listing: ListingSettings,
}

impl<S: EntityStore> Client<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            listing: ListingSettings::default(),
        }
    }

    pub fn with_listing(mut self, listing: ListingSettings) -> Self {
        self.listing = listing;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl Client<AnyStore> {
    /// Build a client for the backend named in `config`.
    pub async fn from_config(config: &VidshareConfig) -> Result<Self, RepoError> {
        let store = AnyStore::from_config(&config.store).await?;
        Ok(Client::new(store).with_listing(config.listing))
    }
}

impl Client<RedisStore> {
    /// Connect to Redis Stack and make sure every search index exists.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, RepoError> {
        let store = RedisStore::connect(url, prefix.into()).await?;
        Ok(Client::new(store))
    }
}

fn parse_id(field: &'static str, raw: &str) -> Result<EntityId, RepoError> {
    EntityId::parse(field, raw.trim())
}

/// Trimmed text that must not be blank.
fn required_text(field: &'static str, raw: &str) -> Result<String, RepoError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RepoError::invalid(field, format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
