use super::support::*;

#[tokio::test]
async fn twenty_five_videos_paged_by_ten() {
    let client = memory_client();
    let owner = register(&client, "pager").await;
    for n in 0..25 {
        insert_video_aged(client.store(), &owner, &format!("video-{n:02}"), n).await;
    }

    let first = client.list_videos(&ListQuery::default().page(1).limit(10)).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total, 25);
    assert_eq!(first.total_pages, 3);

    let third = client.list_videos(&ListQuery::default().page(3).limit(10)).await.unwrap();
    assert_eq!(third.items.len(), 5);
    assert_eq!(third.total, 25);

    let beyond = client.list_videos(&ListQuery::default().page(4).limit(10)).await.unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 25);
}

#[tokio::test]
async fn pages_partition_the_collection() {
    for (count, page_size) in [(0_usize, 10_i64), (1, 10), (10, 10), (11, 10), (37, 7), (5, 1)] {
        let client = memory_client();
        let owner = register(&client, "partition").await;
        for n in 0..count {
            insert_video_aged(client.store(), &owner, &format!("v{n}"), n as i64).await;
        }

        let first = client.list_videos(&ListQuery::default().limit(page_size)).await.unwrap();
        assert_eq!(first.total, count as u64);
        assert_eq!(first.total_pages, (count as u64).div_ceil(page_size as u64));

        let mut seen = Vec::new();
        for page in 1..=first.total_pages.max(1) {
            let listed = client
                .list_videos(&ListQuery::default().page(page as i64).limit(page_size))
                .await
                .unwrap();
            seen.extend(listed.items.into_iter().map(|item| item.row.id));
        }
        assert_eq!(seen.len(), count, "count={count} page_size={page_size}");
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), count, "pages overlap for count={count}");
    }
}

#[tokio::test]
async fn newest_first_by_default_and_sortable_by_title() {
    let client = memory_client();
    let owner = register(&client, "sorter").await;
    let old = insert_video_aged(client.store(), &owner, "Banana", 30).await;
    let mid = insert_video_aged(client.store(), &owner, "apple", 20).await;
    let new = insert_video_aged(client.store(), &owner, "Cherry", 10).await;

    let page = client.list_videos(&ListQuery::default()).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|item| item.row.id.clone()).collect();
    assert_eq!(ids, vec![new.id.clone(), mid.id.clone(), old.id.clone()]);

    let page = client.list_videos(&ListQuery::default().sort("title", "asc")).await.unwrap();
    let titles: Vec<_> = page.items.iter().map(|item| item.row.title.as_str()).collect();
    assert_eq!(titles, vec!["apple", "Banana", "Cherry"]);

    let page = client.list_videos(&ListQuery::default().sort("createdAt", "asc")).await.unwrap();
    assert_eq!(page.items[0].row.id, old.id);
}

#[tokio::test]
async fn search_matches_title_or_description_ignoring_case() {
    let client = memory_client();
    let owner = register(&client, "searcher").await;
    publish(&client, &owner, "Rust Ownership").await;
    publish(&client, &owner, "Cooking pasta").await;
    let mut in_description = publish(&client, &owner, "Weekly vlog").await;
    in_description = client
        .store()
        .update_where::<Video>(
            &in_description.id,
            &Guard::none(),
            &Patch::new().assign("description", "learning RUST at home"),
        )
        .await
        .unwrap()
        .unwrap();

    let page = client.list_videos(&ListQuery::default().search("rust")).await.unwrap();
    assert_eq!(page.total, 2);
    let titles: Vec<_> = page.items.iter().map(|item| item.row.title.as_str()).collect();
    assert!(titles.contains(&"Rust Ownership"));
    assert!(titles.contains(&in_description.title.as_str()));
}

#[tokio::test]
async fn user_filter_narrows_to_one_owner() {
    let client = memory_client();
    let alice = register(&client, "alice").await;
    let bob = register(&client, "bob").await;
    publish(&client, &alice, "a1").await;
    publish(&client, &alice, "a2").await;
    publish(&client, &bob, "b1").await;

    let page = client.list_videos(&ListQuery::default().user(alice.as_str())).await.unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|item| &item.row.owner == alice.id()));

    let err = client.list_videos(&ListQuery::default().user("bogus")).await.unwrap_err();
    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn limits_are_clamped_and_bad_sorts_rejected() {
    let client = memory_client();
    let page = client.list_videos(&ListQuery::default().limit(500).page(-2)).await.unwrap();
    assert_eq!(page.page_size, 100);
    assert_eq!(page.page, 1);
    assert_eq!(page.total_pages, 0);

    let err = client.list_videos(&ListQuery::default().sort("owner", "asc")).await.unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn list_query_deserializes_from_camel_case() {
    let query: ListQuery = serde_json::from_value(serde_json::json!({
        "page": 2,
        "limit": 5,
        "query": "cats",
        "sortBy": "views",
        "sortType": "asc",
    }))
    .unwrap();
    assert_eq!(query.sort_by.as_deref(), Some("views"));
    assert_eq!(query.sort_type.as_deref(), Some("asc"));

    let client = memory_client();
    let page = client.list_videos(&query).await.unwrap();
    assert_eq!((page.page, page.page_size), (2, 5));
}
