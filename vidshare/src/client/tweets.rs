use chrono::Utc;

use super::{Client, parse_id, required_text};
use crate::{
    errors::RepoError,
    filters::FilterCondition,
    id::{EntityId, Principal},
    listing::{ListQuery, ListingPolicy, Page, list},
    models::Tweet,
    ownership::{delete_owned, update_owned},
    patch::Patch,
    store::EntityStore,
};

const TWEET_LISTING: ListingPolicy = ListingPolicy::newest_first();

impl<S: EntityStore> Client<S> {
    pub async fn create_tweet(&self, principal: &Principal, content: &str) -> Result<Tweet, RepoError> {
        let tweet = Tweet {
            id: EntityId::generate(),
            content: required_text("content", content)?,
            owner: principal.id().clone(),
            created_at: Utc::now(),
        };
        self.store.insert(&tweet).await?;
        Ok(tweet)
    }

    /// A user's tweets, newest first.
    pub async fn list_user_tweets(&self, user_id: &str, query: &ListQuery) -> Result<Page<Tweet>, RepoError> {
        let owner = parse_id("userId", user_id)?;
        let params = query
            .into_params(&TWEET_LISTING, &self.listing)?
            .with_condition(FilterCondition::equals("owner", owner.as_str()));
        list(&self.store, &params).await
    }

    pub async fn update_tweet(&self, principal: &Principal, tweet_id: &str, content: &str) -> Result<Tweet, RepoError> {
        let id = parse_id("tweetId", tweet_id)?;
        let content = required_text("content", content)?;
        update_owned(&self.store, &id, principal, Patch::new().assign("content", content)).await
    }

    pub async fn delete_tweet(&self, principal: &Principal, tweet_id: &str) -> Result<(), RepoError> {
        let id = parse_id("tweetId", tweet_id)?;
        delete_owned::<_, Tweet>(&self.store, &id, principal).await
    }
}
