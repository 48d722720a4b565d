//! Keyed entity storage.
//!
//! [`EntityStore`] is the only seam between the operations and durable state.
//! Every method is a single atomic store call: a conditional update or delete
//! either applies completely or not at all.

mod memory;
mod redis_json;

pub use memory::MemoryStore;
pub use redis_json::{RedisStore, cleanup_pattern};

use crate::{
    config::{StoreBackend, StoreConfig},
    errors::RepoError,
    filters::Filter,
    id::EntityId,
    patch::{Guard, Patch, PatchOp},
    types::{Entity, SortSpec, UniqueKey},
};

#[allow(async_fn_in_trait)]
pub trait EntityStore: Clone + Send + Sync {
    async fn get<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, RepoError>;

    /// Batched keyed lookup. Results follow the order of `ids`; missing ids are skipped.
    async fn get_many<T: Entity>(&self, ids: &[EntityId]) -> Result<Vec<T>, RepoError>;

    async fn find_unique<T: Entity>(&self, key: &UniqueKey) -> Result<Option<T>, RepoError>;

    /// Fails with [`RepoError::UniqueConstraintViolation`] on a duplicate id or
    /// any unique key already held by another record.
    async fn insert<T: Entity>(&self, entity: &T) -> Result<(), RepoError>;

    /// Apply `patch` only if the record exists and `guard` holds. `None` when nothing matched.
    async fn update_where<T: Entity>(&self, id: &EntityId, guard: &Guard, patch: &Patch)
    -> Result<Option<T>, RepoError>;

    /// Delete only if the record exists and `guard` holds, releasing its unique keys.
    async fn delete_where<T: Entity>(&self, id: &EntityId, guard: &Guard) -> Result<bool, RepoError>;

    async fn count<T: Entity>(&self, filter: &Filter) -> Result<u64, RepoError>;

    async fn query<T: Entity>(
        &self,
        filter: &Filter,
        sort: Option<SortSpec>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, RepoError>;
}

/// Patches never rewrite identity or unique-constrained fields; those change
/// only through insert and delete.
fn ensure_patchable<T: Entity>(patch: &Patch) -> Result<(), RepoError> {
    for op in patch.ops() {
        let field = match op {
            PatchOp::Assign { field, .. } | PatchOp::AddToSet { field, .. } | PatchOp::Pull { field, .. } => field,
        };
        let constrained = field == "id"
            || T::unique_constraints()
                .iter()
                .any(|constraint| constraint.fields.contains(&field.as_str()));
        if constrained {
            return Err(RepoError::other(format!(
                "field `{field}` of {} cannot be patched",
                T::KIND
            )));
        }
    }
    Ok(())
}

/// Backend chosen at runtime from configuration.
#[derive(Clone)]
pub enum AnyStore {
    Memory(MemoryStore),
    Redis(RedisStore),
}

impl AnyStore {
    pub async fn from_config(config: &StoreConfig) -> Result<Self, RepoError> {
        match config.backend {
            StoreBackend::Memory => Ok(Self::Memory(MemoryStore::new())),
            StoreBackend::Redis => {
                let url = config.redis_url()?;
                let store = RedisStore::connect(&url, config.prefix.clone()).await?;
                Ok(Self::Redis(store))
            }
        }
    }

    pub fn backend(&self) -> StoreBackend {
        match self {
            Self::Memory(_) => StoreBackend::Memory,
            Self::Redis(_) => StoreBackend::Redis,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            AnyStore::Memory($store) => $call.await,
            AnyStore::Redis($store) => $call.await,
        }
    };
}

impl EntityStore for AnyStore {
    async fn get<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, RepoError> {
        dispatch!(self, store => store.get(id))
    }

    async fn get_many<T: Entity>(&self, ids: &[EntityId]) -> Result<Vec<T>, RepoError> {
        dispatch!(self, store => store.get_many(ids))
    }

    async fn find_unique<T: Entity>(&self, key: &UniqueKey) -> Result<Option<T>, RepoError> {
        dispatch!(self, store => store.find_unique(key))
    }

    async fn insert<T: Entity>(&self, entity: &T) -> Result<(), RepoError> {
        dispatch!(self, store => store.insert(entity))
    }

    async fn update_where<T: Entity>(
        &self,
        id: &EntityId,
        guard: &Guard,
        patch: &Patch,
    ) -> Result<Option<T>, RepoError> {
        dispatch!(self, store => store.update_where(id, guard, patch))
    }

    async fn delete_where<T: Entity>(&self, id: &EntityId, guard: &Guard) -> Result<bool, RepoError> {
        dispatch!(self, store => store.delete_where::<T>(id, guard))
    }

    async fn count<T: Entity>(&self, filter: &Filter) -> Result<u64, RepoError> {
        dispatch!(self, store => store.count::<T>(filter))
    }

    async fn query<T: Entity>(
        &self,
        filter: &Filter,
        sort: Option<SortSpec>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, RepoError> {
        dispatch!(self, store => store.query(filter, sort, skip, limit))
    }
}
