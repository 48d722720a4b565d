use chrono::Utc;

use super::{Client, parse_id, required_text};
use crate::{
    errors::RepoError,
    filters::FilterCondition,
    id::{EntityId, Principal},
    listing::{ListQuery, ListingPolicy, Page, list_joined},
    models::Comment,
    ownership::{delete_owned, update_owned},
    patch::Patch,
    projection::{JoinSpec, Joined, OwnerProfile},
    store::EntityStore,
};

const COMMENT_LISTING: ListingPolicy = ListingPolicy::newest_first();

fn comment_owner(comment: &Comment) -> &EntityId {
    &comment.owner
}

const COMMENT_OWNER: JoinSpec<Comment> = JoinSpec::new("owner", comment_owner);

impl<S: EntityStore> Client<S> {
    /// Comments on a video, newest first, each with its author's profile.
    pub async fn list_video_comments(
        &self,
        video_id: &str,
        query: &ListQuery,
    ) -> Result<Page<Joined<Comment, OwnerProfile>>, RepoError> {
        let video = parse_id("videoId", video_id)?;
        let params = query
            .into_params(&COMMENT_LISTING, &self.listing)?
            .with_condition(FilterCondition::equals("video", video.as_str()));
        list_joined(&self.store, &params, COMMENT_OWNER).await
    }

    pub async fn add_comment(&self, principal: &Principal, video_id: &str, content: &str) -> Result<Comment, RepoError> {
        let video = parse_id("videoId", video_id)?;
        let comment = Comment {
            id: EntityId::generate(),
            content: required_text("content", content)?,
            video,
            owner: principal.id().clone(),
            created_at: Utc::now(),
        };
        self.store.insert(&comment).await?;
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        principal: &Principal,
        comment_id: &str,
        content: &str,
    ) -> Result<Comment, RepoError> {
        let id = parse_id("commentId", comment_id)?;
        let content = required_text("content", content)?;
        update_owned(&self.store, &id, principal, Patch::new().assign("content", content)).await
    }

    pub async fn delete_comment(&self, principal: &Principal, comment_id: &str) -> Result<(), RepoError> {
        let id = parse_id("commentId", comment_id)?;
        delete_owned::<_, Comment>(&self.store, &id, principal).await
    }
}
