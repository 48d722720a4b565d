use std::path::PathBuf;

use chrono::Utc;
use log::debug;

use super::{Client, parse_id, required_text};
use crate::{
    errors::RepoError,
    filters::FilterCondition,
    id::{EntityId, Principal},
    listing::{ListQuery, ListingPolicy, Page, list_joined},
    models::{User, Video},
    ownership::{delete_owned, flip_owned_flag, update_owned},
    patch::Patch,
    projection::{JoinSpec, Joined, OwnerProfile, attach},
    store::EntityStore,
    types::{EntityKind, SortField, SortOrder, SortSpec},
    upload::{MediaUploader, upload_required},
};

const VIDEO_SORTS: &[SortField] = &[
    SortField {
        name: "createdAt",
        path: "createdAtTs",
    },
    SortField {
        name: "title",
        path: "title",
    },
    SortField {
        name: "duration",
        path: "duration",
    },
    SortField {
        name: "views",
        path: "views",
    },
];

pub(super) const VIDEO_LISTING: ListingPolicy = ListingPolicy {
    sorts: VIDEO_SORTS,
    default_sort: SortSpec::new("createdAtTs", SortOrder::Desc),
    search_fields: &["title", "description"],
};

fn video_owner(video: &Video) -> &EntityId {
    &video.owner
}

pub(super) const VIDEO_OWNER: JoinSpec<Video> = JoinSpec::new("owner", video_owner);

/// A video to publish from local files.
#[derive(Debug, Clone, Default)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_file: PathBuf,
    pub thumbnail: PathBuf,
}

/// Partial update; blank or absent fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Replacement thumbnail to upload
    pub thumbnail: Option<PathBuf>,
}

impl<S: EntityStore> Client<S> {
    /// Page through videos, optionally searching title and description and
    /// narrowing to one owner via `userId`.
    pub async fn list_videos(&self, query: &ListQuery) -> Result<Page<Joined<Video, OwnerProfile>>, RepoError> {
        let mut params = query.into_params(&VIDEO_LISTING, &self.listing)?;
        if let Some(owner) = query.user_filter()? {
            params = params.with_condition(FilterCondition::equals("owner", owner.as_str()));
        }
        list_joined(&self.store, &params, VIDEO_OWNER).await
    }

    /// Upload both files and store the video as published with zero views.
    pub async fn publish_video<U>(&self, principal: &Principal, new: NewVideo, uploader: &U) -> Result<Video, RepoError>
    where
        U: MediaUploader,
    {
        let title = required_text("title", &new.title)?;
        let description = required_text("description", &new.description)?;
        if new.video_file.as_os_str().is_empty() {
            return Err(RepoError::invalid("videoFile", "videoFile is required"));
        }
        if new.thumbnail.as_os_str().is_empty() {
            return Err(RepoError::invalid("thumbnail", "thumbnail is required"));
        }
        if self.store.get::<User>(principal.id()).await?.is_none() {
            return Err(RepoError::NotFound {
                entity: EntityKind::User,
                entity_id: principal.id().to_string(),
            });
        }

        let media = upload_required(uploader, &new.video_file, "video").await?;
        let thumbnail = upload_required(uploader, &new.thumbnail, "thumbnail").await?;

        let video = Video {
            id: EntityId::generate(),
            title,
            description,
            video_file: media.url,
            thumbnail: thumbnail.url,
            duration: media.duration.filter(|d| d.is_finite()).unwrap_or(0.0),
            views: 0,
            is_published: true,
            owner: principal.id().clone(),
            created_at: Utc::now(),
        };
        self.store.insert(&video).await?;
        debug!("published video {} for {}", video.id, video.owner);
        Ok(video)
    }

    pub async fn get_video(&self, video_id: &str) -> Result<Joined<Video, OwnerProfile>, RepoError> {
        let id = parse_id("videoId", video_id)?;
        let video = self.store.get::<Video>(&id).await?.ok_or(RepoError::NotFound {
            entity: EntityKind::Video,
            entity_id: id.to_string(),
        })?;
        let mut joined = attach(&self.store, vec![video], VIDEO_OWNER).await?;
        joined.pop().ok_or_else(|| RepoError::other("owner join dropped the video"))
    }

    /// Owner-only partial update. A new thumbnail is uploaded before the
    /// ownership-checked write.
    pub async fn update_video<U>(
        &self,
        principal: &Principal,
        video_id: &str,
        update: VideoUpdate,
        uploader: &U,
    ) -> Result<Video, RepoError>
    where
        U: MediaUploader,
    {
        let id = parse_id("videoId", video_id)?;
        let mut patch = Patch::new()
            .assign_supplied("title", update.title)
            .assign_supplied("description", update.description);
        if let Some(path) = update.thumbnail.filter(|p| !p.as_os_str().is_empty()) {
            let thumbnail = upload_required(uploader, &path, "thumbnail").await?;
            patch = patch.assign("thumbnail", thumbnail.url);
        }
        update_owned(&self.store, &id, principal, patch).await
    }

    pub async fn delete_video(&self, principal: &Principal, video_id: &str) -> Result<(), RepoError> {
        let id = parse_id("videoId", video_id)?;
        delete_owned::<_, Video>(&self.store, &id, principal).await
    }

    /// Flip `isPublished` on an owned video and return the new state.
    pub async fn toggle_publish_status(&self, principal: &Principal, video_id: &str) -> Result<Video, RepoError> {
        let id = parse_id("videoId", video_id)?;
        flip_owned_flag(&self.store, &id, principal, "isPublished", |video: &Video| video.is_published).await
    }
}
