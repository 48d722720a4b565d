use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde_json::Value;
use tokio::sync::RwLock;

use super::{EntityStore, ensure_patchable};
use crate::{
    errors::RepoError,
    filters::Filter,
    id::EntityId,
    patch::{Guard, Patch},
    types::{Entity, EntityKind, SortOrder, SortSpec, UniqueKey},
};

#[derive(Debug, Default)]
struct Collection {
    documents: BTreeMap<String, Value>,
    /// (constraint, value) -> holder id
    unique: HashMap<(&'static str, String), String>,
}

/// In-process store. Each operation takes the lock once, so every mutation
/// is atomic with respect to every other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<EntityKind, Collection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection, unfiltered.
    pub async fn len(&self, kind: EntityKind) -> usize {
        let guard = self.inner.read().await;
        guard.get(&kind).map_or(0, |c| c.documents.len())
    }

    pub async fn is_empty(&self) -> bool {
        let guard = self.inner.read().await;
        guard.values().all(|c| c.documents.is_empty())
    }
}

fn claims<T: Entity>(document: &Value) -> Result<Vec<UniqueKey>, RepoError> {
    T::unique_constraints()
        .iter()
        .map(|constraint| UniqueKey::from_document(constraint, document))
        .collect()
}

fn compare_field(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => rank(left).cmp(&rank(right)),
    }
}

impl EntityStore for MemoryStore {
    async fn get<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, RepoError> {
        tokio::task::yield_now().await;
        let guard = self.inner.read().await;
        guard
            .get(&T::KIND)
            .and_then(|c| c.documents.get(id.as_str()))
            .cloned()
            .map(T::from_document)
            .transpose()
    }

    async fn get_many<T: Entity>(&self, ids: &[EntityId]) -> Result<Vec<T>, RepoError> {
        tokio::task::yield_now().await;
        let guard = self.inner.read().await;
        let Some(collection) = guard.get(&T::KIND) else {
            return Ok(Vec::new());
        };
        ids.iter()
            .filter_map(|id| collection.documents.get(id.as_str()).cloned())
            .map(T::from_document)
            .collect()
    }

    async fn find_unique<T: Entity>(&self, key: &UniqueKey) -> Result<Option<T>, RepoError> {
        tokio::task::yield_now().await;
        let guard = self.inner.read().await;
        let Some(collection) = guard.get(&T::KIND) else {
            return Ok(None);
        };
        collection
            .unique
            .get(&(key.constraint, key.value.clone()))
            .and_then(|holder| collection.documents.get(holder))
            .cloned()
            .map(T::from_document)
            .transpose()
    }

    async fn insert<T: Entity>(&self, entity: &T) -> Result<(), RepoError> {
        let document = entity.to_document()?;
        let keys = claims::<T>(&document)?;
        let id = entity.id().as_str().to_string();

        tokio::task::yield_now().await;
        let mut guard = self.inner.write().await;
        let collection = guard.entry(T::KIND).or_default();

        if collection.documents.contains_key(&id) {
            return Err(RepoError::UniqueConstraintViolation {
                constraint: "id".to_string(),
                existing_entity_id: id,
            });
        }
        for key in &keys {
            if let Some(holder) = collection.unique.get(&(key.constraint, key.value.clone())) {
                return Err(RepoError::UniqueConstraintViolation {
                    constraint: key.constraint.to_string(),
                    existing_entity_id: holder.clone(),
                });
            }
        }

        for key in keys {
            collection.unique.insert((key.constraint, key.value), id.clone());
        }
        collection.documents.insert(id.clone(), document);
        log::debug!("inserted {} {}", T::KIND, id);
        Ok(())
    }

    async fn update_where<T: Entity>(
        &self,
        id: &EntityId,
        guard: &Guard,
        patch: &Patch,
    ) -> Result<Option<T>, RepoError> {
        ensure_patchable::<T>(patch)?;

        tokio::task::yield_now().await;
        let mut lock = self.inner.write().await;
        let Some(current) = lock.get_mut(&T::KIND).and_then(|c| c.documents.get_mut(id.as_str())) else {
            return Ok(None);
        };
        if !guard.holds(current) {
            return Ok(None);
        }

        let mut updated = current.clone();
        patch.apply(&mut updated)?;
        // Decode before committing so a bad patch leaves the record untouched.
        let entity = T::from_document(updated.clone())?;
        *current = updated;
        log::debug!("updated {} {}", T::KIND, id);
        Ok(Some(entity))
    }

    async fn delete_where<T: Entity>(&self, id: &EntityId, guard: &Guard) -> Result<bool, RepoError> {
        tokio::task::yield_now().await;
        let mut lock = self.inner.write().await;
        let Some(collection) = lock.get_mut(&T::KIND) else {
            return Ok(false);
        };
        let holds = collection
            .documents
            .get(id.as_str())
            .is_some_and(|document| guard.holds(document));
        if !holds {
            return Ok(false);
        }

        if let Some(document) = collection.documents.remove(id.as_str()) {
            for key in claims::<T>(&document)? {
                let slot = (key.constraint, key.value);
                if collection.unique.get(&slot).is_some_and(|holder| holder == id.as_str()) {
                    collection.unique.remove(&slot);
                }
            }
        }
        log::debug!("deleted {} {}", T::KIND, id);
        Ok(true)
    }

    async fn count<T: Entity>(&self, filter: &Filter) -> Result<u64, RepoError> {
        tokio::task::yield_now().await;
        let guard = self.inner.read().await;
        let count = guard
            .get(&T::KIND)
            .map_or(0, |c| c.documents.values().filter(|d| filter.matches(d)).count());
        Ok(count as u64)
    }

    async fn query<T: Entity>(
        &self,
        filter: &Filter,
        sort: Option<SortSpec>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, RepoError> {
        tokio::task::yield_now().await;
        let guard = self.inner.read().await;
        let Some(collection) = guard.get(&T::KIND) else {
            return Ok(Vec::new());
        };

        // BTreeMap iteration is id order, the tie-breaker for equal sort keys.
        let mut matching: Vec<(&String, &Value)> =
            collection.documents.iter().filter(|(_, d)| filter.matches(d)).collect();
        if let Some(sort) = sort {
            matching.sort_by(|(left_id, left), (right_id, right)| {
                let ordering = compare_field(left.get(sort.field), right.get(sort.field));
                let ordering = match sort.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                };
                ordering.then_with(|| left_id.cmp(right_id))
            });
        }

        matching
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(_, document)| T::from_document(document.clone()))
            .collect()
    }
}
