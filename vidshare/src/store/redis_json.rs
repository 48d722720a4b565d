use std::sync::Arc;

use redis::{AsyncCommands, aio::ConnectionManager, cmd};
use serde::Serialize;
use serde_json::Value;

use super::{EntityStore, ensure_patchable};
use crate::{
    errors::RepoError,
    filters::Filter,
    id::EntityId,
    keys::KeyContext,
    models::{Comment, Like, Playlist, Subscription, Tweet, User, Video},
    patch::{Guard, Patch},
    runtime::{
        invoke_script,
        scripts::{ENTITY_DELETE_SCRIPT, ENTITY_INSERT_SCRIPT, ENTITY_PATCH_SCRIPT},
    },
    search::{IndexDefinition, SearchRequest, ensure_index, execute_count, execute_search, normalize_json_payload},
    types::{Entity, SortSpec, UniqueKey},
};

/// Store backed by RedisJSON documents and RediSearch indexes.
///
/// Documents live at `{prefix}:{collection}:{id}`. Conditional mutations and
/// unique-key claims run as Lua scripts, so each is a single atomic call.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: Arc<str>,
}

#[derive(Serialize)]
struct ConstraintSpec {
    key_prefix: String,
    fields: &'static [&'static str],
    case_insensitive: bool,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    /// Connect and make sure every collection's search index exists.
    pub async fn connect(url: &str, prefix: impl Into<Arc<str>>) -> Result<Self, RepoError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        let store = Self::new(conn, prefix);
        store.ensure_indexes().await?;
        Ok(store)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    pub async fn ensure_indexes(&self) -> Result<(), RepoError> {
        self.ensure_index_for::<User>().await?;
        self.ensure_index_for::<Video>().await?;
        self.ensure_index_for::<Comment>().await?;
        self.ensure_index_for::<Tweet>().await?;
        self.ensure_index_for::<Like>().await?;
        self.ensure_index_for::<Subscription>().await?;
        self.ensure_index_for::<Playlist>().await?;
        Ok(())
    }

    async fn ensure_index_for<T: Entity>(&self) -> Result<(), RepoError> {
        let mut conn = self.conn.clone();
        ensure_index(&mut conn, &self.index_definition::<T>()).await
    }

    /// Drop every index under this prefix, leaving documents in place.
    pub async fn drop_indexes(&self) -> Result<(), RepoError> {
        let mut conn = self.conn.clone();
        let existing: Vec<String> = cmd("FT._LIST").query_async(&mut conn).await?;
        let ctx = self.keys();
        for kind in crate::types::EntityKind::ALL {
            let name = ctx.index(kind.collection());
            if existing.contains(&name) {
                cmd("FT.DROPINDEX").arg(&name).query_async::<()>(&mut conn).await?;
            }
        }
        Ok(())
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix)
    }

    fn index_definition<T: Entity>(&self) -> IndexDefinition {
        let ctx = self.keys();
        IndexDefinition {
            name: ctx.index(T::KIND.collection()),
            prefix: ctx.collection_prefix(T::KIND.collection()),
            schema: T::index_schema(),
        }
    }

    fn entity_key<T: Entity>(&self, id: &str) -> String {
        self.keys().entity(T::KIND.collection(), id)
    }

    fn decode<T: Entity>(payload: String) -> Result<T, RepoError> {
        let normalized = normalize_json_payload(payload)?;
        let document: Value = serde_json::from_str(&normalized)?;
        T::from_document(document)
    }
}

impl EntityStore for RedisStore {
    async fn get<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, RepoError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = cmd("JSON.GET")
            .arg(self.entity_key::<T>(id.as_str()))
            .arg("$")
            .query_async(&mut conn)
            .await?;
        raw.map(Self::decode).transpose()
    }

    async fn get_many<T: Entity>(&self, ids: &[EntityId]) -> Result<Vec<T>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let mut command = cmd("JSON.MGET");
        for id in ids {
            command.arg(self.entity_key::<T>(id.as_str()));
        }
        command.arg("$");
        let raw: Vec<Option<String>> = command.query_async(&mut conn).await?;
        raw.into_iter().flatten().map(Self::decode).collect()
    }

    async fn find_unique<T: Entity>(&self, key: &UniqueKey) -> Result<Option<T>, RepoError> {
        let mut conn = self.conn.clone();
        let claim = self.keys().unique(T::KIND.collection(), key.constraint, &key.value);
        let holder: Option<String> = conn.get(&claim).await?;
        let Some(holder) = holder else {
            return Ok(None);
        };
        let holder = EntityId::try_from(holder)?;
        self.get(&holder).await
    }

    async fn insert<T: Entity>(&self, entity: &T) -> Result<(), RepoError> {
        let document = entity.to_document()?;
        let id = entity.id().as_str();
        let ctx = self.keys();

        let mut keys = vec![self.entity_key::<T>(id)];
        let mut constraint_names = Vec::new();
        for constraint in T::unique_constraints() {
            let claim = UniqueKey::from_document(constraint, &document)?;
            keys.push(ctx.unique(T::KIND.collection(), claim.constraint, &claim.value));
            constraint_names.push(claim.constraint);
        }
        let args = vec![
            id.to_string(),
            serde_json::to_string(&document)?,
            serde_json::to_string(&constraint_names)?,
        ];

        let mut conn = self.conn.clone();
        invoke_script(&mut conn, &ENTITY_INSERT_SCRIPT, &keys, &args).await?;
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
        let keys = vec![self.entity_key::<T>(id.as_str())];
        let args = vec![serde_json::to_string(guard)?, serde_json::to_string(patch)?];

        let mut conn = self.conn.clone();
        let reply = invoke_script(&mut conn, &ENTITY_PATCH_SCRIPT, &keys, &args).await?;
        if !reply.get("matched").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(None);
        }
        let Some(document) = reply.get("document").and_then(Value::as_str) else {
            return Err(RepoError::other("patch script returned no document"));
        };
        log::debug!("updated {} {}", T::KIND, id);
        Self::decode(document.to_string()).map(Some)
    }

    async fn delete_where<T: Entity>(&self, id: &EntityId, guard: &Guard) -> Result<bool, RepoError> {
        let ctx = self.keys();
        let constraints: Vec<ConstraintSpec> = T::unique_constraints()
            .iter()
            .map(|constraint| ConstraintSpec {
                key_prefix: ctx.unique(T::KIND.collection(), constraint.name, ""),
                fields: constraint.fields,
                case_insensitive: constraint.case_insensitive,
            })
            .collect();
        let keys = vec![self.entity_key::<T>(id.as_str())];
        let args = vec![
            id.as_str().to_string(),
            serde_json::to_string(guard)?,
            serde_json::to_string(&constraints)?,
        ];

        let mut conn = self.conn.clone();
        let reply = invoke_script(&mut conn, &ENTITY_DELETE_SCRIPT, &keys, &args).await?;
        let deleted = reply.get("deleted").and_then(Value::as_bool).unwrap_or(false);
        if deleted {
            log::debug!("deleted {} {}", T::KIND, id);
        }
        Ok(deleted)
    }

    async fn count<T: Entity>(&self, filter: &Filter) -> Result<u64, RepoError> {
        if filter.is_unsatisfiable() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let index = self.keys().index(T::KIND.collection());
        execute_count(&mut conn, &index, filter.to_query()).await
    }

    async fn query<T: Entity>(
        &self,
        filter: &Filter,
        sort: Option<SortSpec>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, RepoError> {
        if filter.is_unsatisfiable() || limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let index = self.keys().index(T::KIND.collection());
        let request = SearchRequest {
            index: &index,
            query: filter.to_query(),
            sort,
            offset: skip,
            limit,
        };
        let hits = execute_search(&mut conn, &request).await?;
        hits.documents.into_iter().map(T::from_document).collect()
    }
}

/// Delete all keys matching a pattern (for test cleanup).
///
/// This performs a SCAN + DEL operation to safely delete keys without blocking Redis.
pub async fn cleanup_pattern(conn: &mut ConnectionManager, pattern: &str) -> Result<u64, RepoError> {
    const SCAN_COUNT: usize = 1000;
    let mut cursor: u64 = 0;
    let mut total_deleted: u64 = 0;

    loop {
        let (next_cursor, keys): (u64, Vec<String>) = cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_COUNT)
            .query_async(conn)
            .await?;

        if !keys.is_empty() {
            let deleted: u64 = cmd("DEL").arg(&keys).query_async(conn).await?;
            total_deleted += deleted;
        }

        cursor = next_cursor;
        if cursor == 0 {
            break;
        }
    }

    Ok(total_deleted)
}
