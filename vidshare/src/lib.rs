//! Vidshare core library.
//!
//! Data-access core of a video sharing backend: users publish videos, comment,
//! post tweets, like things, subscribe to channels and curate playlists. Every
//! operation goes through [`Client`] over an [`EntityStore`], either the
//! in-process [`MemoryStore`] or Redis Stack via [`RedisStore`].

pub mod client;
pub mod config;
pub mod errors;
pub mod filters;
pub mod id;
pub mod keys;
pub mod listing;
pub mod models;
pub mod ownership;
pub mod patch;
pub mod projection;
pub mod runtime;
pub mod search;
pub mod store;
pub mod toggle;
pub mod types;
pub mod upload;

pub use client::{
    ChannelStats, Client, NewPlaylist, NewUser, NewVideo, PlaylistDetail, PlaylistUpdate, VideoUpdate,
};
pub use config::{StoreBackend, VidshareConfig};
pub use errors::*;
pub use id::{EntityId, Principal};
pub use listing::{ListQuery, Page};
pub use models::{Comment, Like, LikeTarget, Playlist, Subscription, Tweet, User, Video};
pub use projection::{Joined, OwnerProfile};
pub use store::{AnyStore, EntityStore, MemoryStore, RedisStore};
pub use toggle::ToggleOutcome;
pub use types::{EntityKind, SortOrder};
pub use upload::{MediaUploader, PrefixUploader, UploadedMedia};

// Re-export redis types so users don't need to depend on a specific redis version
pub use redis;
pub use redis::aio::ConnectionManager;
