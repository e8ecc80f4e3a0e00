//! Feedline Core - Feed Query Types
//!
//! Pure data structures shared by every feedline crate: the post model,
//! typed condition trees, query specs, cursors, type URIs, errors and
//! configuration. No I/O lives here.

pub mod config;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod model;
pub mod query;
pub mod type_uri;

pub use config::{FeedConfig, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use cursor::CursorToken;
pub use error::{
    ConfigError, FeedError, FeedResult, InternalError, StorageError, ValidationError,
};
pub use filter::{Clause, Column, CompareOp, Condition, Predicate, Table, Value};
pub use model::{Entity, JoinedRow, Mention, Post, PostType, Row, RowId, TimestampMs};
pub use query::{Direction, Join, JoinKind, QuerySpec, SortKey};
pub use type_uri::{FragmentMatch, TypeUri};
