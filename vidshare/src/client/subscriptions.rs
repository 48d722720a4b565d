use super::{Client, parse_id};
use crate::{
    errors::RepoError,
    filters::FilterCondition,
    id::{EntityId, Principal},
    listing::{ListQuery, ListingPolicy, Page, list_joined},
    models::Subscription,
    projection::{JoinSpec, Joined, OwnerProfile},
    store::EntityStore,
    toggle::{SubscriptionKey, ToggleOutcome, toggle},
};

const SUBSCRIPTION_LISTING: ListingPolicy = ListingPolicy::newest_first();

/// A subscription with the subscriber's profile in place of their id.
pub type ChannelSubscriber = Joined<Subscription, OwnerProfile>;

/// A subscription with the channel's profile in place of its id.
pub type SubscribedChannel = Joined<Subscription, OwnerProfile>;

fn subscriber_of(subscription: &Subscription) -> &EntityId {
    &subscription.subscriber
}

fn channel_of(subscription: &Subscription) -> &EntityId {
    &subscription.channel
}

const SUBSCRIBER: JoinSpec<Subscription> = JoinSpec::new("subscriber", subscriber_of);
const CHANNEL: JoinSpec<Subscription> = JoinSpec::new("channel", channel_of);

impl<S: EntityStore> Client<S> {
    /// Subscribe the principal to `channel_id`, or unsubscribe if already subscribed.
    pub async fn toggle_subscription(&self, principal: &Principal, channel_id: &str) -> Result<ToggleOutcome, RepoError> {
        let key = SubscriptionKey {
            channel: parse_id("channelId", channel_id)?,
            subscriber: principal.id().clone(),
        };
        toggle::<_, Subscription>(&self.store, key).await
    }

    pub async fn channel_subscribers(
        &self,
        channel_id: &str,
        query: &ListQuery,
    ) -> Result<Page<ChannelSubscriber>, RepoError> {
        let channel = parse_id("channelId", channel_id)?;
        let params = query
            .into_params(&SUBSCRIPTION_LISTING, &self.listing)?
            .with_condition(FilterCondition::equals("channel", channel.as_str()));
        list_joined(&self.store, &params, SUBSCRIBER).await
    }

    pub async fn subscribed_channels(
        &self,
        subscriber_id: &str,
        query: &ListQuery,
    ) -> Result<Page<SubscribedChannel>, RepoError> {
        let subscriber = parse_id("subscriberId", subscriber_id)?;
        let params = query
            .into_params(&SUBSCRIPTION_LISTING, &self.listing)?
            .with_condition(FilterCondition::equals("subscriber", subscriber.as_str()));
        list_joined(&self.store, &params, CHANNEL).await
    }
}
