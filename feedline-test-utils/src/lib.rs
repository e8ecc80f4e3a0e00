//! Feedline Test Utilities
//!
//! Shared test infrastructure for the feedline workspace:
//! - Proptest generators for posts, cursors and type URIs
//! - A seeded timeline store for end-to-end scenarios
//! - Assertions for feed ordering and error kinds

// Re-export mock storage from its source crate
pub use feedline_storage::{FeedFixture, MockFeedStore};

// Re-export core types for convenience
pub use feedline_core::{
    Column, CursorToken, Entity, FeedError, FeedResult, Mention, Post, PostType, Row, RowId,
    StorageError, TimestampMs, TypeUri, ValidationError, Value,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for feed entities.

    use super::*;
    use proptest::prelude::*;

    /// Generate an opaque version string, sometimes with an inner space.
    pub fn arb_version() -> impl Strategy<Value = String> {
        "[a-f0-9]{1,12}( [a-f0-9]{1,4})?"
    }

    /// Generate a millisecond timestamp in a plausible range.
    pub fn arb_timestamp() -> impl Strategy<Value = TimestampMs> {
        1_500_000_000_000i64..1_900_000_000_000i64
    }

    /// Generate a cursor, with or without a version.
    pub fn arb_cursor() -> impl Strategy<Value = CursorToken> {
        (any::<i64>(), prop::option::of(arb_version()))
            .prop_map(|(timestamp, version)| CursorToken { timestamp, version })
    }

    /// Generate an entity URI.
    pub fn arb_entity_uri() -> impl Strategy<Value = String> {
        "[a-z]{1,8}".prop_map(|name| format!("https://{}.example", name))
    }

    /// Generate a type URI, sometimes with a fragment.
    pub fn arb_type_uri() -> impl Strategy<Value = TypeUri> {
        ("[a-z]{1,8}", prop::option::of("[a-z]{1,6}")).prop_filter_map(
            "type URI must parse",
            |(name, fragment)| {
                let raw = match fragment {
                    Some(fragment) => format!("https://tent.io/types/{}/v0#{}", name, fragment),
                    None => format!("https://tent.io/types/{}/v0", name),
                };
                TypeUri::parse(&raw).ok()
            },
        )
    }

    /// Generate a post owned by `user_id`.
    pub fn arb_post_for(user_id: RowId) -> impl Strategy<Value = Post> {
        (
            1i64..1_000_000,
            arb_entity_uri(),
            1i64..5,
            arb_timestamp(),
            0i64..60_000,
            arb_version(),
            any::<bool>(),
        )
            .prop_map(
                move |(id, entity, type_id, published_at, delay, version, public)| Post {
                    id,
                    user_id,
                    entity,
                    type_id,
                    published_at,
                    received_at: published_at + delay,
                    version,
                    version_published_at: published_at,
                    version_received_at: published_at + delay,
                    public,
                },
            )
    }

    /// Generate a post owned by one of a handful of users.
    pub fn arb_post() -> impl Strategy<Value = Post> {
        (1i64..4).prop_flat_map(arb_post_for)
    }

    /// Generate posts with distinct ids.
    pub fn arb_posts(max: usize) -> impl Strategy<Value = Vec<Post>> {
        prop::collection::vec(arb_post(), 0..max).prop_map(|mut posts| {
            for (i, post) in posts.iter_mut().enumerate() {
                post.id = i as RowId + 1;
            }
            posts
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! A small seeded timeline shared by end-to-end tests.
    //!
    //! Owner [`OWNER`] has twelve posts, ids 1..=12, received at `id * 1000`
    //! and published ten milliseconds earlier. Posts 11 and 12 share a
    //! receive time so the version tie-break matters. Even ids are public.
    //! [`OTHER_USER`] has three posts that must never leak into the owner's
    //! feed.

    use super::*;

    pub const OWNER: RowId = 1;
    pub const OTHER_USER: RowId = 2;

    pub const STATUS_TYPE: &str = "https://tent.io/types/status/v0";
    pub const ESSAY_TYPE: &str = "https://tent.io/types/essay/v0";

    pub const ALICE: &str = "https://alice.example";
    pub const BOB: &str = "https://bob.example";
    pub const CAROL: &str = "https://carol.example";

    /// Stored types: status (1), status#reply (2), essay (3).
    pub fn types() -> Vec<PostType> {
        vec![
            PostType {
                id: 1,
                base: STATUS_TYPE.to_string(),
                fragment: None,
            },
            PostType {
                id: 2,
                base: STATUS_TYPE.to_string(),
                fragment: Some("reply".to_string()),
            },
            PostType {
                id: 3,
                base: ESSAY_TYPE.to_string(),
                fragment: None,
            },
        ]
    }

    /// Stored entities: alice (1), bob (2). Carol is unknown.
    pub fn entities() -> Vec<Entity> {
        vec![
            Entity {
                id: 1,
                entity: ALICE.to_string(),
            },
            Entity {
                id: 2,
                entity: BOB.to_string(),
            },
        ]
    }

    /// A public status post by alice for [`OWNER`].
    pub fn post(id: RowId, received_at: TimestampMs) -> Post {
        Post {
            id,
            user_id: OWNER,
            entity: ALICE.to_string(),
            type_id: 1,
            published_at: received_at - 10,
            received_at,
            version: format!("v{:04}", id),
            version_published_at: received_at - 10,
            version_received_at: received_at,
            public: true,
        }
    }

    /// The owner's timeline plus a few foreign posts.
    ///
    /// Types cycle status, status#reply, essay by id. Odd ids are by alice,
    /// even by bob.
    pub fn timeline_posts() -> Vec<Post> {
        let mut posts = Vec::new();
        for id in 1..=12 {
            let received_at = if id == 12 { 11_000 } else { id * 1000 };
            posts.push(Post {
                entity: (if id % 2 == 1 { ALICE } else { BOB }).to_string(),
                type_id: (id - 1) % 3 + 1,
                public: id % 2 == 0,
                ..post(id, received_at)
            });
        }
        for id in 101..=103 {
            posts.push(Post {
                user_id: OTHER_USER,
                ..post(id, (id - 100) * 1000)
            });
        }
        posts
    }

    /// Mentions: post 2 mentions bob's post `b1`, post 4 mentions alice,
    /// post 6 mentions both alice and bob.
    pub fn mentions() -> Vec<Mention> {
        vec![
            Mention {
                post_id: 2,
                entity_id: 2,
                post: Some("b1".to_string()),
            },
            Mention {
                post_id: 4,
                entity_id: 1,
                post: None,
            },
            Mention {
                post_id: 6,
                entity_id: 1,
                post: None,
            },
            Mention {
                post_id: 6,
                entity_id: 2,
                post: None,
            },
        ]
    }

    pub fn timeline_fixture() -> FeedFixture {
        FeedFixture {
            posts: timeline_posts(),
            types: types(),
            entities: entities(),
            mentions: mentions(),
        }
    }

    /// A [`MockFeedStore`] seeded with [`timeline_fixture`].
    pub fn timeline_store() -> MockFeedStore {
        MockFeedStore::from_fixture(timeline_fixture())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for feed-specific invariants.

    use super::*;
    use std::collections::HashSet;

    /// Assert that a FeedResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &FeedResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a FeedResult is a Validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &FeedResult<T>) {
        match result {
            Err(FeedError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that a FeedResult is a Storage error.
    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &FeedResult<T>) {
        match result {
            Err(FeedError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }

    /// Assert posts are newest-first on `column`, ties broken by version descending.
    #[track_caller]
    pub fn assert_newest_first(posts: &[Post], column: Column) {
        for pair in posts.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let key = |p: &Post| (p.value(column), p.version.clone());
            let (ta, va) = key(a);
            let (tb, vb) = key(b);
            let ordered = match (ta, tb) {
                (Some(Value::Int(ta)), Some(Value::Int(tb))) => ta > tb || (ta == tb && va >= vb),
                other => panic!("Column {} is not a timestamp: {:?}", column, other),
            };
            assert!(
                ordered,
                "Posts {} and {} out of order on {}",
                a.id, b.id, column
            );
        }
    }

    /// Assert no post id appears twice.
    #[track_caller]
    pub fn assert_unique_ids(posts: &[Post]) {
        let mut seen = HashSet::new();
        for post in posts {
            assert!(seen.insert(post.id), "Post {} appears more than once", post.id);
        }
    }

    /// Assert every post belongs to `user_id`.
    #[track_caller]
    pub fn assert_owned_by(posts: &[Post], user_id: RowId) {
        for post in posts {
            assert_eq!(post.user_id, user_id, "Post {} leaked from another user", post.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_timeline_store_is_seeded() {
        let store = timeline_store();
        assert_eq!(store.post_count(), 15);
    }

    #[test]
    fn test_fixture_round_trips_through_json() {
        let fixture = timeline_fixture();
        let json = serde_json::to_string(&fixture).unwrap();
        let back = super::FeedFixture::from_json(&json).unwrap();
        assert_eq!(back, fixture);
    }
}
