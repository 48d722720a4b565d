use super::support::*;

#[tokio::test]
async fn listing_joins_owners_in_one_batch() {
    let client = Client::new(CountingStore::new(MemoryStore::new()));
    let owners = [
        register(&client, "one").await,
        register(&client, "two").await,
        register(&client, "three").await,
    ];
    for n in 0..12 {
        insert_video_aged(client.store(), &owners[n % 3], &format!("v{n}"), n as i64).await;
    }
    client.store().reset();

    let page = client.list_videos(&ListQuery::default().limit(12)).await.unwrap();
    assert_eq!(page.items.len(), 12);
    assert!(page.items.iter().all(|item| item.joined.is_some()));
    assert_eq!(client.store().get_many_calls(), 1);
}

#[tokio::test]
async fn empty_page_needs_no_join() {
    let client = Client::new(CountingStore::new(MemoryStore::new()));
    let page = client.list_videos(&ListQuery::default()).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(client.store().get_many_calls(), 0);
}

#[tokio::test]
async fn dangling_owner_serializes_as_null() {
    let client = memory_client();
    let ghost = Principal::new(EntityId::generate());
    let video = insert_video_aged(client.store(), &ghost, "orphan", 1).await;

    let fetched = client.get_video(video.id.as_str()).await.unwrap();
    assert!(fetched.joined.is_none());
    let encoded = serde_json::to_value(&fetched).unwrap();
    assert!(encoded["owner"].is_null());
    assert_eq!(encoded["title"], "orphan");
}

#[tokio::test]
async fn owner_profile_exposes_only_public_fields() {
    let client = memory_client();
    let owner = register(&client, "visible").await;
    let video = publish(&client, &owner, "clip").await;

    let encoded = serde_json::to_value(client.get_video(video.id.as_str()).await.unwrap()).unwrap();
    let profile = encoded["owner"].as_object().unwrap();
    let mut keys: Vec<_> = profile.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["avatar", "fullName", "id", "username"]);
    assert_eq!(profile["username"], "visible");
}

#[tokio::test]
async fn subscriber_listing_is_batched_too() {
    let client = Client::new(CountingStore::new(MemoryStore::new()));
    let creator = register(&client, "creator").await;
    for n in 0..5 {
        let fan = register(&client, &format!("fan{n}")).await;
        client.toggle_subscription(&fan, creator.as_str()).await.unwrap();
    }
    client.store().reset();

    let page = client
        .channel_subscribers(creator.as_str(), &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(client.store().get_many_calls(), 1);
}
