use log::debug;
use serde::Serialize;

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use super::Client;
use crate::{
    errors::RepoError,
    filters::{Filter, FilterCondition},
    id::Principal,
    listing::{ListQuery, ListingPolicy, Page, list},
    models::{Like, Subscription, Video},
    store::EntityStore,
    types::{EntityKind, SortOrder, SortSpec},
};

/// Video ids per `targetId` clause when counting likes.
const LIKE_COUNT_CHUNK: usize = 100;
/// Page size used when walking all of a channel's videos.
const SCAN_BATCH: u64 = 500;

const CHANNEL_LISTING: ListingPolicy = ListingPolicy::newest_first();

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: u64,
    pub total_views: u64,
    pub total_subscribers: u64,
    /// Likes on the channel's videos
    pub total_likes: u64,
}

impl<S: EntityStore> Client<S> {
    /// Aggregate counters for the principal's channel.
    pub async fn channel_stats(&self, principal: &Principal) -> Result<ChannelStats, RepoError> {
        let subscribers = Filter::new().with_eq("channel", principal.as_str());
        let (videos, total_subscribers) = tokio::join!(
            self.all_channel_videos(principal),
            self.store.count::<Subscription>(&subscribers),
        );
        let videos = videos?;

        let mut total_likes = 0;
        for chunk in videos.chunks(LIKE_COUNT_CHUNK) {
            let filter = Filter::new()
                .with_eq("targetKind", EntityKind::Video.name())
                .with(FilterCondition::any_of("targetId", chunk.iter().map(|v| v.id.as_str())));
            total_likes += self.store.count::<Like>(&filter).await?;
        }

        let stats = ChannelStats {
            total_videos: videos.len() as u64,
            total_views: videos.iter().map(|v| v.views).sum(),
            total_subscribers: total_subscribers?,
            total_likes,
        };
        debug!("channel stats for {}: {stats:?}", principal.as_str());
        Ok(stats)
    }

    /// The principal's own videos, newest first, including unpublished ones.
    pub async fn channel_videos(&self, principal: &Principal, query: &ListQuery) -> Result<Page<Video>, RepoError> {
        let params = query
            .into_params(&CHANNEL_LISTING, &self.listing)?
            .with_condition(FilterCondition::equals("owner", principal.as_str()));
        list(&self.store, &params).await
    }

    async fn all_channel_videos(&self, principal: &Principal) -> Result<Vec<Video>, RepoError> {
        let filter = Filter::new().with_eq("owner", principal.as_str());
        let sort = SortSpec::new("createdAtTs", SortOrder::Asc);
        let mut videos = Vec::new();
        loop {
            let batch: Vec<Video> = self
                .store
                .query(&filter, Some(sort), videos.len() as u64, SCAN_BATCH)
                .await?;
            let done = (batch.len() as u64) < SCAN_BATCH;
            videos.extend(batch);
            if done {
                return Ok(videos);
            }
        }
    }
}
