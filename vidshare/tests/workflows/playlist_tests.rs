use vidshare::{ChannelStats, NewPlaylist};

use super::support::*;

async fn playlist_with(client: &Client<MemoryStore>, owner: &Principal, videos: &[&Video]) -> EntityId {
    let playlist = client
        .create_playlist(
            owner,
            NewPlaylist {
                name: "Watch later".to_string(),
                description: "queued".to_string(),
            },
        )
        .await
        .unwrap();
    for video in videos {
        client
            .add_video_to_playlist(owner, playlist.id.as_str(), video.id.as_str())
            .await
            .unwrap();
    }
    playlist.id
}

#[tokio::test]
async fn playlist_detail_resolves_videos_in_order_with_owners() {
    let client = memory_client();
    let curator = register(&client, "curator").await;
    let alice = register(&client, "alice").await;
    let bob = register(&client, "bob").await;
    let a = publish(&client, &alice, "from-alice").await;
    let b = publish(&client, &bob, "from-bob").await;

    let id = playlist_with(&client, &curator, &[&b, &a, &b]).await;
    let detail = client.get_playlist(id.as_str()).await.unwrap();

    assert_eq!(detail.playlist.videos, vec![b.id.clone(), a.id.clone()]);
    let resolved: Vec<_> = detail
        .videos
        .iter()
        .map(|item| (item.row.id.clone(), item.joined.as_ref().unwrap().username.clone()))
        .collect();
    assert_eq!(resolved, vec![(b.id.clone(), "bob".to_string()), (a.id.clone(), "alice".to_string())]);

    let encoded = serde_json::to_value(&detail).unwrap();
    assert_eq!(encoded["videos"][0]["owner"]["username"], "bob");
    assert_eq!(encoded["owner"], curator.as_str());
}

#[tokio::test]
async fn removing_and_deleting_playlists() {
    let client = memory_client();
    let curator = register(&client, "curator").await;
    let v = publish(&client, &curator, "v").await;
    let id = playlist_with(&client, &curator, &[&v]).await;

    let emptied = client
        .remove_video_from_playlist(&curator, id.as_str(), v.id.as_str())
        .await
        .unwrap();
    assert!(emptied.videos.is_empty());

    client.delete_playlist(&curator, id.as_str()).await.unwrap();
    let err = client.get_playlist(id.as_str()).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: EntityKind::Playlist, .. }));
}

#[tokio::test]
async fn user_playlists_are_scoped_and_paged() {
    let client = memory_client();
    let curator = register(&client, "curator").await;
    let other = register(&client, "other").await;
    for _ in 0..3 {
        playlist_with(&client, &curator, &[]).await;
    }
    playlist_with(&client, &other, &[]).await;

    let page = client
        .user_playlists(curator.as_str(), &ListQuery::default().limit(2))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|p| &p.playlist.owner == curator.id()));
}

#[tokio::test]
async fn user_playlists_resolve_videos_and_drop_deleted_ones() {
    let client = memory_client();
    let curator = register(&client, "curator").await;
    let alice = register(&client, "alice").await;
    let kept = publish(&client, &alice, "kept").await;
    let gone = publish(&client, &curator, "gone").await;
    playlist_with(&client, &curator, &[&gone, &kept]).await;
    playlist_with(&client, &curator, &[&kept]).await;
    client.delete_video(&curator, gone.id.as_str()).await.unwrap();

    let page = client
        .user_playlists(curator.as_str(), &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    for detail in &page.items {
        let ids: Vec<_> = detail.videos.iter().map(|v| v.row.id.clone()).collect();
        assert_eq!(ids, vec![kept.id.clone()]);
    }
    // stored ids are untouched
    assert!(page.items.iter().any(|d| d.playlist.videos.contains(&gone.id)));

    let encoded = serde_json::to_value(&page).unwrap();
    let first = &encoded["items"][0]["videos"][0];
    assert_eq!(first["title"], "kept");
    assert_eq!(first["owner"]["username"], "alice");
}

#[tokio::test]
async fn user_playlists_batch_video_lookups_per_page() {
    let store = CountingStore::new(MemoryStore::new());
    let client = Client::new(store.clone());
    let curator = register(&client, "curator").await;
    let a = publish(&client, &curator, "a").await;
    let b = publish(&client, &curator, "b").await;
    for _ in 0..3 {
        let playlist = client
            .create_playlist(
                &curator,
                NewPlaylist {
                    name: "mix".to_string(),
                    description: "both".to_string(),
                },
            )
            .await
            .unwrap();
        for video in [&a, &b] {
            client
                .add_video_to_playlist(&curator, playlist.id.as_str(), video.id.as_str())
                .await
                .unwrap();
        }
    }

    store.reset();
    let page = client
        .user_playlists(curator.as_str(), &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.items.iter().all(|d| d.videos.len() == 2));
    // one for the videos, one for their owners
    assert_eq!(store.get_many_calls(), 2);
}

#[tokio::test]
async fn dashboard_totals_for_a_channel() {
    let client = memory_client();
    let creator = register(&client, "creator").await;
    let fans = [register(&client, "fan1").await, register(&client, "fan2").await];
    let first = publish(&client, &creator, "first").await;
    let second = publish(&client, &creator, "second").await;
    client
        .store()
        .update_where::<Video>(&second.id, &Guard::none(), &Patch::new().assign("views", 40))
        .await
        .unwrap();
    client.toggle_publish_status(&creator, first.id.as_str()).await.unwrap();

    for fan in &fans {
        client.toggle_subscription(fan, creator.as_str()).await.unwrap();
        client.toggle_video_like(fan, first.id.as_str()).await.unwrap();
    }
    client.toggle_video_like(&fans[0], second.id.as_str()).await.unwrap();

    let stats = client.channel_stats(&creator).await.unwrap();
    assert_eq!(
        stats,
        ChannelStats {
            total_videos: 2,
            total_views: 40,
            total_subscribers: 2,
            total_likes: 3,
        }
    );

    // unpublished videos still belong to the channel
    let videos = client.channel_videos(&creator, &ListQuery::default()).await.unwrap();
    assert_eq!(videos.total, 2);
    assert!(videos.items.iter().any(|v| !v.is_published));
}

#[tokio::test]
async fn comments_and_tweets_list_newest_first() {
    let client = memory_client();
    let author = register(&client, "author").await;
    let video = publish(&client, &author, "clip").await;
    for text in ["one", "two", "three"] {
        client.add_comment(&author, video.id.as_str(), text).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    }
    let other_video = publish(&client, &author, "other").await;
    client.add_comment(&author, other_video.id.as_str(), "elsewhere").await.unwrap();

    let page = client
        .list_video_comments(video.id.as_str(), &ListQuery::default())
        .await
        .unwrap();
    let texts: Vec<_> = page.items.iter().map(|c| c.row.content.as_str()).collect();
    assert_eq!(texts, vec!["three", "two", "one"]);
    assert_eq!(page.items[0].joined.as_ref().unwrap().username, "author");

    assert!(
        client
            .add_comment(&author, video.id.as_str(), "   ")
            .await
            .unwrap_err()
            .is_invalid_argument()
    );
}
