use vidshare::{Like, LikeTarget, Subscription};

use super::support::*;

#[tokio::test]
async fn like_toggled_three_times() {
    let client = memory_client();
    let owner = register(&client, "creator").await;
    let fan = register(&client, "fan").await;
    let video = publish(&client, &owner, "clip").await;

    let outcomes: Vec<bool> = {
        let mut outcomes = Vec::new();
        for _ in 0..3 {
            outcomes.push(client.toggle_video_like(&fan, video.id.as_str()).await.unwrap().active);
        }
        outcomes
    };
    assert_eq!(outcomes, vec![true, false, true]);
    assert_eq!(client.store().len(EntityKind::Like).await, 1);
}

#[tokio::test]
async fn duplicate_like_insert_is_rejected_by_the_store() {
    let client = memory_client();
    let fan = Principal::new(EntityId::generate());
    let target = LikeTarget::Comment(EntityId::generate());
    let like = |id: EntityId| Like {
        id,
        liked_by: fan.id().clone(),
        target: target.clone(),
        created_at: Utc::now(),
    };

    let first = like(EntityId::generate());
    client.store().insert(&first).await.unwrap();
    let err = client.store().insert(&like(EntityId::generate())).await.unwrap_err();
    match err {
        RepoError::UniqueConstraintViolation {
            constraint,
            existing_entity_id,
        } => {
            assert_eq!(constraint, "liker_target");
            assert_eq!(existing_entity_id, first.id.to_string());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn racing_toggles_never_leave_two_likes() {
    let client = memory_client();
    let fan = Principal::new(EntityId::generate());
    let tweet = EntityId::generate();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let client = client.clone();
        let fan = fan.clone();
        let tweet = tweet.clone();
        handles.push(tokio::spawn(async move {
            client.toggle_tweet_like(&fan, tweet.as_str()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(client.store().len(EntityKind::Like).await <= 1);
}

#[tokio::test]
async fn likes_on_different_kinds_are_independent() {
    let client = memory_client();
    let fan = Principal::new(EntityId::generate());
    let id = EntityId::generate();
    assert!(client.toggle_video_like(&fan, id.as_str()).await.unwrap().active);
    assert!(client.toggle_comment_like(&fan, id.as_str()).await.unwrap().active);
    assert!(client.toggle_tweet_like(&fan, id.as_str()).await.unwrap().active);
    assert_eq!(client.store().len(EntityKind::Like).await, 3);
}

#[tokio::test]
async fn subscription_toggles_and_rejects_self() {
    let client = memory_client();
    let creator = register(&client, "creator").await;
    let fan = register(&client, "fan").await;

    assert!(client.toggle_subscription(&fan, creator.as_str()).await.unwrap().active);
    assert!(!client.toggle_subscription(&fan, creator.as_str()).await.unwrap().active);
    assert!(client.toggle_subscription(&fan, creator.as_str()).await.unwrap().active);
    assert_eq!(client.store().len(EntityKind::Subscription).await, 1);

    let before = client.store().len(EntityKind::Subscription).await;
    let err = client.toggle_subscription(&creator, creator.as_str()).await.unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(client.store().len(EntityKind::Subscription).await, before);
}

#[tokio::test]
async fn liked_videos_are_newest_like_first_and_skip_deleted() {
    let client = memory_client();
    let creator = register(&client, "creator").await;
    let fan = register(&client, "fan").await;
    let first = publish(&client, &creator, "first").await;
    let second = publish(&client, &creator, "second").await;
    let doomed = publish(&client, &creator, "doomed").await;

    for video in [&first, &second, &doomed] {
        client.toggle_video_like(&fan, video.id.as_str()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    // A tweet like must not show up among liked videos.
    client.toggle_tweet_like(&fan, EntityId::generate().as_str()).await.unwrap();
    client.delete_video(&creator, doomed.id.as_str()).await.unwrap();

    let page = client.liked_videos(&fan, &ListQuery::default()).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|item| item.row.id.clone()).collect();
    assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);
    assert_eq!(page.items[0].joined.as_ref().unwrap().username, "creator");
    // paging counts likes, including the one whose video is gone
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn subscription_records_are_unique_per_pair() {
    let client = memory_client();
    let channel = EntityId::generate();
    let subscriber = EntityId::generate();
    let record = |id: EntityId| Subscription {
        id,
        channel: channel.clone(),
        subscriber: subscriber.clone(),
        created_at: Utc::now(),
    };
    client.store().insert(&record(EntityId::generate())).await.unwrap();
    let err = client.store().insert(&record(EntityId::generate())).await.unwrap_err();
    assert!(matches!(err, RepoError::UniqueConstraintViolation { .. }));
}
