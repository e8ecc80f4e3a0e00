//! Async collaborator traits for feed queries.
//!
//! The feed engine never talks to a database directly. It resolves names
//! through [`TypeResolver`] and [`MentionResolver`], then hands one
//! [`QuerySpec`] to a [`QueryExecutor`]. Implementations compile specs into
//! their own query language.

use ::async_trait::async_trait;
use feedline_core::{FeedResult, Post, QuerySpec, RowId, TypeUri};
use std::collections::HashMap;

/// Resolves requested content types to type ids.
#[async_trait]
pub trait TypeResolver: Send + Sync {
    /// Ids of every stored type matching any of `types`.
    ///
    /// One batched lookup. An empty result is not an error.
    async fn resolve_types(&self, types: &[TypeUri]) -> FeedResult<Vec<RowId>>;
}

/// Resolves entity identifiers named in mention filters to entity ids.
#[async_trait]
pub trait MentionResolver: Send + Sync {
    /// Map of identifier to id for every identifier that exists.
    ///
    /// One batched lookup. Unknown identifiers are simply missing from the map.
    async fn resolve_entities(&self, entities: &[String]) -> FeedResult<HashMap<String, RowId>>;
}

/// Runs a posts query.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Rows matching `spec`, in the order its sort keys (and `reverse`) ask for,
    /// truncated to `spec.limit`.
    async fn execute(&self, spec: &QuerySpec) -> FeedResult<Vec<Post>>;
}

/// Anything that can serve a whole feed request.
pub trait FeedStore: TypeResolver + MentionResolver + QueryExecutor {}

impl<T: TypeResolver + MentionResolver + QueryExecutor> FeedStore for T {}
