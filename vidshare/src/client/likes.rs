use super::{Client, parse_id, videos::VIDEO_OWNER};
use crate::{
    errors::RepoError,
    filters::FilterCondition,
    id::{EntityId, Principal},
    listing::{ListQuery, ListingPolicy, Page, list},
    models::{Like, LikeTarget, Video},
    projection::{Joined, OwnerProfile, attach},
    store::EntityStore,
    toggle::{LikeKey, ToggleOutcome, toggle},
    types::EntityKind,
};

const LIKE_LISTING: ListingPolicy = ListingPolicy::newest_first();

impl<S: EntityStore> Client<S> {
    pub async fn toggle_video_like(&self, principal: &Principal, video_id: &str) -> Result<ToggleOutcome, RepoError> {
        let target = LikeTarget::Video(parse_id("videoId", video_id)?);
        self.toggle_like(principal, target).await
    }

    pub async fn toggle_comment_like(&self, principal: &Principal, comment_id: &str) -> Result<ToggleOutcome, RepoError> {
        let target = LikeTarget::Comment(parse_id("commentId", comment_id)?);
        self.toggle_like(principal, target).await
    }

    pub async fn toggle_tweet_like(&self, principal: &Principal, tweet_id: &str) -> Result<ToggleOutcome, RepoError> {
        let target = LikeTarget::Tweet(parse_id("tweetId", tweet_id)?);
        self.toggle_like(principal, target).await
    }

    async fn toggle_like(&self, principal: &Principal, target: LikeTarget) -> Result<ToggleOutcome, RepoError> {
        let key = LikeKey {
            liked_by: principal.id().clone(),
            target,
        };
        toggle::<_, Like>(&self.store, key).await
    }

    /// Videos the principal liked, most recent like first.
    ///
    /// Paging runs over the likes; a like whose video has since been deleted
    /// is dropped from `items` but still counted in `total`.
    pub async fn liked_videos(
        &self,
        principal: &Principal,
        query: &ListQuery,
    ) -> Result<Page<Joined<Video, OwnerProfile>>, RepoError> {
        let params = query
            .into_params(&LIKE_LISTING, &self.listing)?
            .with_condition(FilterCondition::equals("likedBy", principal.as_str()))
            .with_condition(FilterCondition::equals("targetKind", EntityKind::Video.name()));
        let mut page = list::<S, Like>(&self.store, &params).await?;

        let ids: Vec<EntityId> = std::mem::take(&mut page.items)
            .into_iter()
            .map(|like| like.target.id().clone())
            .collect();
        let videos: Vec<Video> = self.store.get_many(&ids).await?;
        let joined = attach(&self.store, videos, VIDEO_OWNER).await?;
        Ok(page.with_items(joined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn liking_twice_unlikes() {
        let client = Client::new(MemoryStore::new());
        let me = Principal::new(EntityId::generate());
        let tweet = EntityId::generate();
        assert!(client.toggle_tweet_like(&me, tweet.as_str()).await.unwrap().active);
        assert!(!client.toggle_tweet_like(&me, tweet.as_str()).await.unwrap().active);
        assert_eq!(client.store().len(EntityKind::Like).await, 0);
    }

    #[tokio::test]
    async fn malformed_target_is_rejected() {
        let client = Client::new(MemoryStore::new());
        let me = Principal::new(EntityId::generate());
        let err = client.toggle_comment_like(&me, "abc").await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(client.store().is_empty().await);
    }
}
