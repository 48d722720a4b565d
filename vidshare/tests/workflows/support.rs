pub(crate) use chrono::{Duration, Utc};
pub(crate) use std::path::PathBuf;
pub(crate) use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
pub(crate) use vidshare::{
    Client, Comment, EntityId, EntityKind, EntityStore, ListQuery, MemoryStore, NewUser, NewVideo, PrefixUploader,
    Principal, RepoError, Video,
    filters::Filter,
    patch::{Guard, Patch},
    types::{Entity, SortSpec, UniqueKey},
};

pub(crate) fn memory_client() -> Client<MemoryStore> {
    Client::new(MemoryStore::new())
}

pub(crate) fn uploader() -> PrefixUploader {
    PrefixUploader::new("https://cdn.example.test/media/")
        .expect("valid base url")
        .with_duration(90.0)
}

pub(crate) async fn register<S: EntityStore>(client: &Client<S>, username: &str) -> Principal {
    let user = client
        .register_user(NewUser {
            username: username.to_string(),
            full_name: format!("{username} full name"),
            avatar: Some(format!("https://cdn.example.test/{username}.png")),
        })
        .await
        .expect("register user");
    Principal::new(user.id)
}

pub(crate) async fn publish<S: EntityStore>(client: &Client<S>, owner: &Principal, title: &str) -> Video {
    client
        .publish_video(
            owner,
            NewVideo {
                title: title.to_string(),
                description: format!("about {title}"),
                video_file: PathBuf::from(format!("{title}.mp4")),
                thumbnail: PathBuf::from(format!("{title}.png")),
            },
            &uploader(),
        )
        .await
        .expect("publish video")
}

/// Store a video directly with a chosen age, so ordering is deterministic.
pub(crate) async fn insert_video_aged<S: EntityStore>(
    store: &S,
    owner: &Principal,
    title: &str,
    minutes_ago: i64,
) -> Video {
    let video = Video {
        id: EntityId::generate(),
        title: title.to_string(),
        description: format!("about {title}"),
        video_file: format!("https://cdn.example.test/media/{title}.mp4"),
        thumbnail: format!("https://cdn.example.test/media/{title}.png"),
        duration: 10.0,
        views: 0,
        is_published: true,
        owner: owner.id().clone(),
        created_at: Utc::now() - Duration::minutes(minutes_ago),
    };
    store.insert(&video).await.expect("insert video");
    video
}

/// Wraps a store and counts batched lookups.
#[derive(Clone)]
pub(crate) struct CountingStore<S> {
    inner: S,
    get_many_calls: Arc<AtomicUsize>,
}

impl<S: EntityStore> CountingStore<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            get_many_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn get_many_calls(&self) -> usize {
        self.get_many_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.get_many_calls.store(0, Ordering::SeqCst);
    }
}

impl<S: EntityStore> EntityStore for CountingStore<S> {
    async fn get<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, RepoError> {
        self.inner.get(id).await
    }

    async fn get_many<T: Entity>(&self, ids: &[EntityId]) -> Result<Vec<T>, RepoError> {
        self.get_many_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_many(ids).await
    }

    async fn find_unique<T: Entity>(&self, key: &UniqueKey) -> Result<Option<T>, RepoError> {
        self.inner.find_unique(key).await
    }

    async fn insert<T: Entity>(&self, entity: &T) -> Result<(), RepoError> {
        self.inner.insert(entity).await
    }

    async fn update_where<T: Entity>(&self, id: &EntityId, guard: &Guard, patch: &Patch) -> Result<Option<T>, RepoError> {
        self.inner.update_where(id, guard, patch).await
    }

    async fn delete_where<T: Entity>(&self, id: &EntityId, guard: &Guard) -> Result<bool, RepoError> {
        self.inner.delete_where::<T>(id, guard).await
    }

    async fn count<T: Entity>(&self, filter: &Filter) -> Result<u64, RepoError> {
        self.inner.count::<T>(filter).await
    }

    async fn query<T: Entity>(
        &self,
        filter: &Filter,
        sort: Option<SortSpec>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, RepoError> {
        self.inner.query(filter, sort, skip, limit).await
    }
}
