//! Feed Assembly
//!
//! [`FeedAssembler`] drives one feed request end to end: parse, resolve,
//! build, execute once, trim, link. It holds only shared handles to its
//! collaborators and an immutable config, so one instance serves concurrent
//! requests.

use std::sync::Arc;

use feedline_core::{FeedConfig, FeedResult, Post, RowId, TimestampMs};
use feedline_query::{
    build_query, resolve, CursorPagination, FeedParams, FeedRequest, Pagination, Viewer,
};
use feedline_storage::{FeedStore, MentionResolver, QueryExecutor, TypeResolver};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// Current version of a post as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionView {
    pub id: String,
    pub published_at: TimestampMs,
    pub received_at: TimestampMs,
}

/// A post on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: RowId,
    pub entity: String,
    pub type_id: RowId,
    pub published_at: TimestampMs,
    pub received_at: TimestampMs,
    pub version: VersionView,
    pub public: bool,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            entity: post.entity,
            type_id: post.type_id,
            published_at: post.published_at,
            received_at: post.received_at,
            version: VersionView {
                id: post.version,
                published_at: post.version_published_at,
                received_at: post.version_received_at,
            },
            public: post.public,
        }
    }
}

/// One page of a feed, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    pub posts: Vec<PostView>,
    pub pagination: Pagination,
}

// ============================================================================
// ASSEMBLER
// ============================================================================

/// Serves feed requests against a set of storage collaborators.
#[derive(Clone)]
pub struct FeedAssembler {
    types: Arc<dyn TypeResolver>,
    mentions: Arc<dyn MentionResolver>,
    executor: Arc<dyn QueryExecutor>,
    config: FeedConfig,
}

impl FeedAssembler {
    /// Create an assembler; fails if `config` is inconsistent.
    pub fn new(
        types: Arc<dyn TypeResolver>,
        mentions: Arc<dyn MentionResolver>,
        executor: Arc<dyn QueryExecutor>,
        config: FeedConfig,
    ) -> FeedResult<Self> {
        config.validate()?;
        Ok(Self {
            types,
            mentions,
            executor,
            config,
        })
    }

    /// Create an assembler backed by a single store.
    pub fn with_store<S: FeedStore + 'static>(store: Arc<S>, config: FeedConfig) -> FeedResult<Self> {
        Self::new(store.clone(), store.clone(), store, config)
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Serve one feed request.
    pub async fn handle(&self, params: &FeedParams, viewer: Viewer) -> FeedResult<FeedPage> {
        let span = tracing::info_span!(
            "feed_request",
            owner = viewer.owner_user_id,
            authenticated = viewer.authenticated,
            fetched = tracing::field::Empty,
            returned = tracing::field::Empty,
        );
        self.run(params, viewer).instrument(span).await
    }

    async fn run(&self, params: &FeedParams, viewer: Viewer) -> FeedResult<FeedPage> {
        let request = FeedRequest::parse(params, &self.config).map_err(|err| {
            tracing::debug!(error = %err, "Rejected feed request");
            err
        })?;

        let resolved = resolve(&request, self.types.as_ref(), self.mentions.as_ref()).await?;
        let (spec, plan) = build_query(&request, &resolved, viewer)?;
        tracing::debug!(query = %spec, bindings = spec.bindings.len(), "Built feed query");

        let rows = self.executor.execute(&spec).await.map_err(|err| {
            tracing::error!(error = %err, "Feed query failed");
            err
        })?;
        let fetched = rows.len();

        let page = CursorPagination::finish(&plan, rows);
        let span = tracing::Span::current();
        span.record("fetched", fetched);
        span.record("returned", page.posts.len());
        tracing::debug!(
            beyond_limit = page.beyond_limit_exists,
            has_next = page.pagination.next.is_some(),
            "Assembled feed page"
        );

        Ok(FeedPage {
            posts: page.posts.into_iter().map(PostView::from).collect(),
            pagination: page.pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedline_core::{CursorToken, StorageError, Table};
    use feedline_storage::MockFeedStore;

    fn post(id: RowId, received_at: TimestampMs) -> Post {
        Post {
            id,
            user_id: 1,
            entity: "https://alice.example".to_string(),
            type_id: 1,
            published_at: received_at - 1,
            received_at,
            version: format!("v{}", id),
            version_published_at: received_at - 1,
            version_received_at: received_at,
            public: true,
        }
    }

    fn assembler(store: &Arc<MockFeedStore>) -> FeedAssembler {
        FeedAssembler::with_store(store.clone(), FeedConfig::default()).unwrap()
    }

    #[test]
    fn test_post_view_wire_shape() {
        let view = PostView::from(post(7, 700));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["version"]["id"], "v7");
        assert_eq!(json["version"]["received_at"], 700);
        assert_eq!(json["received_at"], 700);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = Arc::new(MockFeedStore::new());
        let config = FeedConfig {
            default_page_limit: 50,
            max_page_limit: 10,
        };
        assert!(FeedAssembler::with_store(store, config).is_err());
    }

    #[tokio::test]
    async fn test_handle_pages_and_links() {
        let store = Arc::new(MockFeedStore::new());
        for id in 1..=3 {
            store.insert_post(post(id, id * 100));
        }

        let page = assembler(&store)
            .handle(&FeedParams::new().with("limit", "2"), Viewer::owner(1))
            .await
            .unwrap();

        let ids: Vec<RowId> = page.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(page.pagination.next, Some(CursorToken::new(200, "v2")));
        assert_eq!(page.pagination.previous, Some(CursorToken::new(300, "v3")));
        assert_eq!(store.calls_against(Table::Posts), 1);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"]["next"], "200 v2");
    }

    #[tokio::test]
    async fn test_validation_error_skips_storage() {
        let store = Arc::new(MockFeedStore::new());
        let err = assembler(&store)
            .handle(&FeedParams::new().with("limit", "many"), Viewer::owner(1))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.received_specs().is_empty());
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let store = Arc::new(MockFeedStore::new());
        store.insert_post(post(1, 100));
        store.fail_next_call(StorageError::QueryFailed {
            table: "posts".to_string(),
            reason: "connection reset".to_string(),
        });

        let result = assembler(&store)
            .handle(&FeedParams::new(), Viewer::owner(1))
            .await;
        assert!(matches!(
            result,
            Err(feedline_core::FeedError::Storage(StorageError::QueryFailed { .. }))
        ));
    }
}
