use vidshare::{NewPlaylist, PlaylistUpdate, Tweet, VideoUpdate};

use super::support::*;

#[tokio::test]
async fn non_owner_cannot_update_comment() {
    let client = memory_client();
    let author = register(&client, "author").await;
    let intruder = register(&client, "intruder").await;
    let video = publish(&client, &author, "clip").await;
    let comment = client.add_comment(&author, video.id.as_str(), "  first!  ").await.unwrap();
    assert_eq!(comment.content, "first!");

    let err = client
        .update_comment(&intruder, comment.id.as_str(), "defaced")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFoundOrNotOwned { entity: EntityKind::Comment }));
    assert_eq!(err.status_code(), 404);

    let stored: Comment = client.store().get(&comment.id).await.unwrap().unwrap();
    assert_eq!(stored.content, "first!");
}

#[tokio::test]
async fn non_owner_cannot_delete_anything() {
    let client = memory_client();
    let owner = register(&client, "owner").await;
    let intruder = register(&client, "intruder").await;
    let video = publish(&client, &owner, "clip").await;
    let comment = client.add_comment(&owner, video.id.as_str(), "mine").await.unwrap();
    let tweet = client.create_tweet(&owner, "hello").await.unwrap();
    let playlist = client
        .create_playlist(
            &owner,
            NewPlaylist {
                name: "mix".to_string(),
                description: "songs".to_string(),
            },
        )
        .await
        .unwrap();

    let errors = [
        client.delete_video(&intruder, video.id.as_str()).await.unwrap_err(),
        client.delete_comment(&intruder, comment.id.as_str()).await.unwrap_err(),
        client.delete_tweet(&intruder, tweet.id.as_str()).await.unwrap_err(),
        client.delete_playlist(&intruder, playlist.id.as_str()).await.unwrap_err(),
    ];
    assert!(errors.iter().all(RepoError::is_not_found_or_not_owned));

    for kind in [EntityKind::Video, EntityKind::Comment, EntityKind::Tweet, EntityKind::Playlist] {
        assert_eq!(client.store().len(kind).await, 1, "{kind} was touched");
    }
}

#[tokio::test]
async fn missing_and_foreign_are_indistinguishable() {
    let client = memory_client();
    let owner = register(&client, "owner").await;
    let intruder = register(&client, "intruder").await;
    let tweet = client.create_tweet(&owner, "hello").await.unwrap();

    let foreign = client.update_tweet(&intruder, tweet.id.as_str(), "x").await.unwrap_err();
    let missing = client
        .update_tweet(&intruder, EntityId::generate().as_str(), "x")
        .await
        .unwrap_err();
    assert_eq!(foreign.to_string(), missing.to_string());
    assert_eq!(foreign.status_code(), missing.status_code());

    let stored: Tweet = client.store().get(&tweet.id).await.unwrap().unwrap();
    assert_eq!(stored.content, "hello");
}

#[tokio::test]
async fn owner_delete_is_final() {
    let client = memory_client();
    let owner = register(&client, "owner").await;
    let video = publish(&client, &owner, "clip").await;

    client.delete_video(&owner, video.id.as_str()).await.unwrap();
    let err = client.delete_video(&owner, video.id.as_str()).await.unwrap_err();
    assert!(err.is_not_found_or_not_owned());
    let err = client.get_video(video.id.as_str()).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: EntityKind::Video, .. }));
}

#[tokio::test]
async fn falsy_fields_do_not_overwrite() {
    let client = memory_client();
    let owner = register(&client, "owner").await;
    let video = publish(&client, &owner, "Original").await;

    let update = VideoUpdate {
        title: Some(String::new()),
        description: None,
        thumbnail: None,
    };
    let same = client
        .update_video(&owner, video.id.as_str(), update, &uploader())
        .await
        .unwrap();
    assert_eq!(same.title, "Original");
    assert_eq!(same.description, video.description);

    let playlist = client
        .create_playlist(
            &owner,
            NewPlaylist {
                name: "keep".to_string(),
                description: "old".to_string(),
            },
        )
        .await
        .unwrap();
    let updated = client
        .update_playlist(
            &owner,
            playlist.id.as_str(),
            PlaylistUpdate {
                name: Some(String::new()),
                description: Some("new".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "keep");
    assert_eq!(updated.description, "new");
}

#[tokio::test]
async fn malformed_ids_fail_before_the_store() {
    let client = memory_client();
    let owner = Principal::new(EntityId::generate());
    assert!(client.delete_video(&owner, "../etc").await.unwrap_err().is_invalid_argument());
    assert!(client.update_comment(&owner, "", "x").await.unwrap_err().is_invalid_argument());
    assert!(client.get_playlist("short").await.unwrap_err().is_invalid_argument());
    assert!(Principal::require(None).unwrap_err().is_invalid_argument());
}
