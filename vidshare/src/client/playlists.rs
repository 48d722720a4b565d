use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Serialize, Serializer, ser::Error as _};
use serde_json::Value;

use super::{Client, parse_id, required_text, videos::VIDEO_OWNER};
use crate::{
    errors::RepoError,
    filters::FilterCondition,
    id::{EntityId, Principal},
    listing::{ListQuery, ListingPolicy, Page, list},
    models::{Playlist, Video},
    ownership::{delete_owned, update_owned},
    patch::Patch,
    projection::{Joined, OwnerProfile, attach},
    store::EntityStore,
    types::EntityKind,
};

const PLAYLIST_LISTING: ListingPolicy = ListingPolicy::newest_first();

#[derive(Debug, Clone, Default)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
}

/// Partial update; blank or absent fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A playlist with its videos resolved in playlist order. Videos that no
/// longer exist are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistDetail {
    pub playlist: Playlist,
    pub videos: Vec<Joined<Video, OwnerProfile>>,
}

impl Serialize for PlaylistDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.playlist).map_err(S::Error::custom)?;
        let Value::Object(map) = &mut value else {
            return Err(S::Error::custom("playlist must serialize to an object"));
        };
        map.insert(
            "videos".to_string(),
            serde_json::to_value(&self.videos).map_err(S::Error::custom)?,
        );
        value.serialize(serializer)
    }
}

impl<S: EntityStore> Client<S> {
    pub async fn create_playlist(&self, principal: &Principal, new: NewPlaylist) -> Result<Playlist, RepoError> {
        let playlist = Playlist {
            id: EntityId::generate(),
            name: required_text("name", &new.name)?,
            description: required_text("description", &new.description)?,
            owner: principal.id().clone(),
            videos: Vec::new(),
            created_at: Utc::now(),
        };
        self.store.insert(&playlist).await?;
        Ok(playlist)
    }

    /// A user's playlists, newest first, with their videos resolved.
    pub async fn user_playlists(&self, user_id: &str, query: &ListQuery) -> Result<Page<PlaylistDetail>, RepoError> {
        let owner = parse_id("userId", user_id)?;
        let params = query
            .into_params(&PLAYLIST_LISTING, &self.listing)?
            .with_condition(FilterCondition::equals("owner", owner.as_str()));
        let mut page = list::<_, Playlist>(&self.store, &params).await?;
        let playlists = std::mem::take(&mut page.items);
        let details = self.resolve_videos(playlists).await?;
        Ok(page.with_items(details))
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistDetail, RepoError> {
        let id = parse_id("playlistId", playlist_id)?;
        let playlist = self.store.get::<Playlist>(&id).await?.ok_or(RepoError::NotFound {
            entity: EntityKind::Playlist,
            entity_id: id.to_string(),
        })?;
        let mut details = self.resolve_videos(vec![playlist]).await?;
        details
            .pop()
            .ok_or_else(|| RepoError::other("playlist resolution returned nothing"))
    }

    /// Append a video unless the playlist already holds it.
    pub async fn add_video_to_playlist(
        &self,
        principal: &Principal,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<Playlist, RepoError> {
        let id = parse_id("playlistId", playlist_id)?;
        let video = parse_id("videoId", video_id)?;
        let patch = Patch::new().add_to_set("videos", video.as_str());
        update_owned(&self.store, &id, principal, patch).await
    }

    pub async fn remove_video_from_playlist(
        &self,
        principal: &Principal,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<Playlist, RepoError> {
        let id = parse_id("playlistId", playlist_id)?;
        let video = parse_id("videoId", video_id)?;
        let patch = Patch::new().pull("videos", video.as_str());
        update_owned(&self.store, &id, principal, patch).await
    }

    pub async fn update_playlist(
        &self,
        principal: &Principal,
        playlist_id: &str,
        update: PlaylistUpdate,
    ) -> Result<Playlist, RepoError> {
        let id = parse_id("playlistId", playlist_id)?;
        let patch = Patch::new()
            .assign_supplied("name", update.name)
            .assign_supplied("description", update.description);
        update_owned(&self.store, &id, principal, patch).await
    }

    pub async fn delete_playlist(&self, principal: &Principal, playlist_id: &str) -> Result<(), RepoError> {
        let id = parse_id("playlistId", playlist_id)?;
        delete_owned::<_, Playlist>(&self.store, &id, principal).await
    }

    /// One video lookup and one owner lookup for all of `playlists` together.
    async fn resolve_videos(&self, playlists: Vec<Playlist>) -> Result<Vec<PlaylistDetail>, RepoError> {
        let ids: Vec<EntityId> = {
            let mut seen = HashSet::new();
            playlists
                .iter()
                .flat_map(|playlist| playlist.videos.iter())
                .filter(|id| seen.insert(*id))
                .cloned()
                .collect()
        };
        let videos: Vec<Video> = if ids.is_empty() {
            Vec::new()
        } else {
            self.store.get_many(&ids).await?
        };
        let resolved: HashMap<EntityId, Joined<Video, OwnerProfile>> = attach(&self.store, videos, VIDEO_OWNER)
            .await?
            .into_iter()
            .map(|joined| (joined.row.id.clone(), joined))
            .collect();

        Ok(playlists
            .into_iter()
            .map(|playlist| {
                let videos = playlist.videos.iter().filter_map(|id| resolved.get(id).cloned()).collect();
                PlaylistDetail { playlist, videos }
            })
            .collect())
    }
}
