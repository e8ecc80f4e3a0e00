//! Feedline Storage - Collaborator Traits and Mock Implementation
//!
//! Defines the storage boundary the feed engine talks to and an in-memory
//! implementation that evaluates [`QuerySpec`]s directly. Production
//! backends compile specs into their own query language instead.

pub mod async_trait;
pub mod eval;
pub mod lookup;

pub use async_trait::{FeedStore, MentionResolver, QueryExecutor, TypeResolver};
pub use lookup::{entity_lookup_spec, type_lookup_spec};

use ::async_trait::async_trait;
use feedline_core::{
    Entity, FeedResult, JoinedRow, Mention, Post, PostType, QuerySpec, RowId, StorageError,
    Table, TypeUri,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

// ============================================================================
// FIXTURES
// ============================================================================

/// Serialized contents of a [`MockFeedStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedFixture {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub types: Vec<PostType>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

/// Errors loading a fixture file.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FeedFixture {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

// ============================================================================
// MOCK STORE
// ============================================================================

/// In-memory feed store for testing and local tooling.
///
/// Implements all three collaborator traits by evaluating specs with
/// [`eval`]. Every spec it receives is recorded so tests can assert on
/// round-trips.
#[derive(Debug, Clone, Default)]
pub struct MockFeedStore {
    posts: Arc<RwLock<Vec<Post>>>,
    types: Arc<RwLock<Vec<PostType>>>,
    entities: Arc<RwLock<Vec<Entity>>>,
    mentions: Arc<RwLock<Vec<Mention>>>,
    received: Arc<RwLock<Vec<QuerySpec>>>,
    next_failure: Arc<RwLock<Option<StorageError>>>,
}

impl MockFeedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with a fixture.
    pub fn from_fixture(fixture: FeedFixture) -> Self {
        let store = Self::new();
        store.posts.write().unwrap_or_else(PoisonError::into_inner).extend(fixture.posts);
        store.types.write().unwrap_or_else(PoisonError::into_inner).extend(fixture.types);
        store
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(fixture.entities);
        store
            .mentions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(fixture.mentions);
        store
    }

    pub fn insert_post(&self, post: Post) {
        self.posts.write().unwrap_or_else(PoisonError::into_inner).push(post);
    }

    pub fn insert_type(&self, ty: PostType) {
        self.types.write().unwrap_or_else(PoisonError::into_inner).push(ty);
    }

    pub fn insert_entity(&self, entity: Entity) {
        self.entities.write().unwrap_or_else(PoisonError::into_inner).push(entity);
    }

    pub fn insert_mention(&self, mention: Mention) {
        self.mentions.write().unwrap_or_else(PoisonError::into_inner).push(mention);
    }

    /// Make the next call (lookup or query) fail with `error`.
    pub fn fail_next_call(&self, error: StorageError) {
        *self.next_failure.write().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Every spec received so far, lookups included, in arrival order.
    pub fn received_specs(&self) -> Vec<QuerySpec> {
        self.received.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of specs received against `table`.
    pub fn calls_against(&self, table: Table) -> usize {
        self.received
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|spec| spec.table == table)
            .count()
    }

    pub fn post_count(&self) -> usize {
        self.posts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn begin(&self, spec: &QuerySpec) -> FeedResult<()> {
        self.received
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .push(spec.clone());
        if let Some(error) = self
            .next_failure
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .take()
        {
            tracing::warn!(table = %spec.table, error = %error, "Injected storage failure");
            return Err(error.into());
        }
        Ok(())
    }

    fn select_posts(&self, spec: &QuerySpec) -> FeedResult<Vec<Post>> {
        let posts = self.posts.read().map_err(|_| StorageError::LockPoisoned)?;

        let mut selected: Vec<Post> = match spec.joins.as_slice() {
            [] => eval::filter_rows(posts.iter().cloned(), spec)?,
            [join] if join.table == Table::Mentions => {
                let mentions = self.mentions.read().map_err(|_| StorageError::LockPoisoned)?;
                let mut joined = Vec::new();
                for post in posts.iter() {
                    let key = eval::cell(post, join.right)?;
                    for mention in mentions.iter() {
                        if eval::cell(mention, join.left)?.compare(&key) == Some(Ordering::Equal) {
                            joined.push(JoinedRow {
                                left: post,
                                right: Some(mention),
                            });
                        }
                    }
                }
                eval::filter_rows(joined, spec)?
                    .into_iter()
                    .map(|row| row.left.clone())
                    .collect()
            }
            joins => {
                let joins: Vec<String> = joins.iter().map(ToString::to_string).collect();
                return Err(StorageError::QueryFailed {
                    table: spec.table.to_string(),
                    reason: format!("unsupported join: {}", joins.join(", ")),
                }
                .into());
            }
        };

        if spec.distinct {
            let mut seen = HashSet::new();
            selected.retain(|post| seen.insert(post.id));
        }

        eval::sort_rows(&mut selected, &spec.effective_sort());
        if let Some(limit) = spec.limit {
            selected.truncate(limit as usize);
        }
        Ok(selected)
    }
}

#[async_trait]
impl TypeResolver for MockFeedStore {
    async fn resolve_types(&self, types: &[TypeUri]) -> FeedResult<Vec<RowId>> {
        let spec = type_lookup_spec(types);
        self.begin(&spec)?;

        let rows = self.types.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut matched = eval::filter_rows(rows.iter().cloned(), &spec)?;
        eval::sort_rows(&mut matched, &spec.effective_sort());

        let mut ids: Vec<RowId> = matched.into_iter().map(|ty| ty.id).collect();
        ids.dedup();
        tracing::debug!(requested = types.len(), resolved = ids.len(), "Resolved types");
        Ok(ids)
    }
}

#[async_trait]
impl MentionResolver for MockFeedStore {
    async fn resolve_entities(&self, entities: &[String]) -> FeedResult<HashMap<String, RowId>> {
        let spec = entity_lookup_spec(entities);
        self.begin(&spec)?;

        let rows = self.entities.read().map_err(|_| StorageError::LockPoisoned)?;
        let resolved: HashMap<String, RowId> = eval::filter_rows(rows.iter().cloned(), &spec)?
            .into_iter()
            .map(|entity| (entity.entity, entity.id))
            .collect();
        tracing::debug!(
            requested = entities.len(),
            resolved = resolved.len(),
            "Resolved mention entities"
        );
        Ok(resolved)
    }
}

#[async_trait]
impl QueryExecutor for MockFeedStore {
    async fn execute(&self, spec: &QuerySpec) -> FeedResult<Vec<Post>> {
        if spec.table != Table::Posts {
            return Err(StorageError::QueryFailed {
                table: spec.table.to_string(),
                reason: "executor only serves posts queries".to_string(),
            }
            .into());
        }
        self.begin(spec)?;
        let rows = self.select_posts(spec)?;
        tracing::debug!(rows = rows.len(), limit = ?spec.limit, "Executed posts query");
        Ok(rows)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use feedline_core::{Clause, Column, FeedError, Join, SortKey};

    fn make_post(id: RowId, received_at: i64, public: bool) -> Post {
        Post {
            id,
            user_id: 1,
            entity: "https://alice.example".to_string(),
            type_id: 1,
            published_at: received_at,
            received_at,
            version: format!("v{:04}", id),
            version_published_at: received_at,
            version_received_at: received_at,
            public,
        }
    }

    fn posts_spec() -> QuerySpec {
        let mut spec = QuerySpec::new(Table::Posts);
        spec.sort = vec![
            SortKey::desc(Column::PostReceivedAt),
            SortKey::desc(Column::PostVersion),
        ];
        spec
    }

    #[tokio::test]
    async fn test_execute_sorts_and_limits() {
        let store = MockFeedStore::new();
        for (id, at) in [(1, 30), (2, 10), (3, 20)] {
            store.insert_post(make_post(id, at, true));
        }

        let mut spec = posts_spec();
        spec.limit = Some(2);
        let rows = store.execute(&spec).await.unwrap();
        let ids: Vec<RowId> = rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_execute_reverse_traverses_ascending() {
        let store = MockFeedStore::new();
        for (id, at) in [(1, 30), (2, 10), (3, 20)] {
            store.insert_post(make_post(id, at, true));
        }

        let mut spec = posts_spec();
        spec.reverse = true;
        spec.limit = Some(2);
        let rows = store.execute(&spec).await.unwrap();
        let ids: Vec<RowId> = rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_join_with_distinct_collapses_duplicates() {
        let store = MockFeedStore::new();
        store.insert_post(make_post(1, 10, true));
        store.insert_post(make_post(2, 20, true));
        for entity_id in [7, 8] {
            store.insert_mention(Mention {
                post_id: 1,
                entity_id,
                post: None,
            });
        }

        let mut spec = posts_spec();
        spec.joins.push(Join::inner(
            Table::Mentions,
            Column::MentionPostId,
            Column::PostId,
        ));
        spec.and(Clause::is_in(Column::MentionEntityId, vec![7i64, 8]));

        let rows = store.execute(&spec).await.unwrap();
        assert_eq!(rows.len(), 2, "without distinct the join duplicates post 1");

        spec.distinct = true;
        let rows = store.execute(&spec).await.unwrap();
        let ids: Vec<RowId> = rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_join_follows_declared_columns() {
        let store = MockFeedStore::new();
        store.insert_post(make_post(1, 10, true));
        store.insert_post(make_post(2, 20, true));
        // Mention of post 1 whose entity id happens to equal post 2's id.
        store.insert_mention(Mention {
            post_id: 1,
            entity_id: 2,
            post: None,
        });

        let mut by_post = posts_spec();
        by_post.joins.push(Join::inner(
            Table::Mentions,
            Column::MentionPostId,
            Column::PostId,
        ));
        let ids: Vec<RowId> = store.execute(&by_post).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1]);

        let mut by_entity = posts_spec();
        by_entity.joins.push(Join::inner(
            Table::Mentions,
            Column::MentionEntityId,
            Column::PostId,
        ));
        let ids: Vec<RowId> = store.execute(&by_entity).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_unsupported_join_is_rejected() {
        let store = MockFeedStore::new();
        store.insert_post(make_post(1, 10, true));

        let mut spec = posts_spec();
        spec.joins.push(Join::inner(Table::Types, Column::TypeId, Column::PostTypeId));
        assert!(matches!(
            store.execute(&spec).await,
            Err(FeedError::Storage(StorageError::QueryFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_resolve_types_batched() {
        let store = MockFeedStore::new();
        let status = "https://tent.io/types/status/v0";
        store.insert_type(PostType {
            id: 1,
            base: status.to_string(),
            fragment: None,
        });
        store.insert_type(PostType {
            id: 2,
            base: status.to_string(),
            fragment: Some("reply".to_string()),
        });

        let all = store
            .resolve_types(&[TypeUri::parse(status).unwrap()])
            .await
            .unwrap();
        assert_eq!(all, vec![1, 2]);

        let bare = store
            .resolve_types(&[TypeUri::parse(&format!("{}#", status)).unwrap()])
            .await
            .unwrap();
        assert_eq!(bare, vec![1]);

        let none = store
            .resolve_types(&[TypeUri::parse("https://example.com/unknown").unwrap()])
            .await
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(store.calls_against(Table::Types), 3);
    }

    #[tokio::test]
    async fn test_resolve_entities_skips_unknown() {
        let store = MockFeedStore::new();
        store.insert_entity(Entity {
            id: 5,
            entity: "alice".to_string(),
        });

        let resolved = store
            .resolve_entities(&["alice".to_string(), "mallory".to_string()])
            .await
            .unwrap();
        assert_eq!(resolved.get("alice"), Some(&5));
        assert!(!resolved.contains_key("mallory"));
        assert_eq!(store.calls_against(Table::Entities), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_propagates_once() {
        let store = MockFeedStore::new();
        store.insert_post(make_post(1, 10, true));
        store.fail_next_call(StorageError::Timeout {
            table: "posts".to_string(),
            elapsed_ms: 50,
        });

        let err = store.execute(&posts_spec()).await.unwrap_err();
        assert!(matches!(err, FeedError::Storage(StorageError::Timeout { .. })));
        assert_eq!(store.execute(&posts_spec()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_rejects_non_posts_spec() {
        let store = MockFeedStore::new();
        let err = store.execute(&QuerySpec::new(Table::Types)).await.unwrap_err();
        assert!(matches!(err, FeedError::Storage(StorageError::QueryFailed { .. })));
    }

    #[test]
    fn test_fixture_from_json() {
        let fixture = FeedFixture::from_json(
            r#"{
                "posts": [{
                    "id": 1, "user_id": 1, "entity": "https://alice.example", "type_id": 1,
                    "published_at": 10, "received_at": 11, "version": "a",
                    "version_published_at": 10, "version_received_at": 11, "public": true
                }],
                "types": [{"id": 1, "base": "https://tent.io/types/status/v0", "fragment": null}]
            }"#,
        )
        .unwrap();
        let store = MockFeedStore::from_fixture(fixture);
        assert_eq!(store.post_count(), 1);
    }
}
