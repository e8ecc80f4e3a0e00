//! Entity types read by the feed engine
//!
//! All of these are read-only from the engine's point of view. Timestamps are
//! integer milliseconds since the epoch.

use crate::{Column, Value};
use serde::{Deserialize, Serialize};

/// Internal row identifier.
pub type RowId = i64;

/// Millisecond timestamp.
pub type TimestampMs = i64;

/// A post in the `posts` relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Post {
    pub id: RowId,
    /// Owning user; every post belongs to exactly one
    pub user_id: RowId,
    /// Author entity identifier
    pub entity: String,
    pub type_id: RowId,
    pub published_at: TimestampMs,
    pub received_at: TimestampMs,
    /// Opaque version identifier, compared lexicographically
    pub version: String,
    /// Publish time of the current version
    pub version_published_at: TimestampMs,
    /// Receive time of the current version
    pub version_received_at: TimestampMs,
    pub public: bool,
}

/// A content type in the `types` relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostType {
    pub id: RowId,
    /// Canonical type URI without fragment
    pub base: String,
    /// `None` is an explicitly absent fragment
    pub fragment: Option<String>,
}

/// An external identity in the `entities` relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub id: RowId,
    pub entity: String,
}

/// "Post `post_id` mentions entity `entity_id`", optionally a specific post of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    pub post_id: RowId,
    pub entity_id: RowId,
    pub post: Option<String>,
}

/// Column access for rows the storage evaluator walks.
pub trait Row {
    /// Value of `column`, or `None` when the row has no such column.
    fn value(&self, column: Column) -> Option<Value>;
}

impl Row for Post {
    fn value(&self, column: Column) -> Option<Value> {
        let value = match column {
            Column::PostId => Value::Int(self.id),
            Column::PostUserId => Value::Int(self.user_id),
            Column::PostEntity => Value::Text(self.entity.clone()),
            Column::PostTypeId => Value::Int(self.type_id),
            Column::PostPublishedAt => Value::Int(self.published_at),
            Column::PostReceivedAt => Value::Int(self.received_at),
            Column::PostVersion => Value::Text(self.version.clone()),
            Column::PostVersionPublishedAt => Value::Int(self.version_published_at),
            Column::PostVersionReceivedAt => Value::Int(self.version_received_at),
            Column::PostPublic => Value::Bool(self.public),
            _ => return None,
        };
        Some(value)
    }
}

impl Row for PostType {
    fn value(&self, column: Column) -> Option<Value> {
        match column {
            Column::TypeId => Some(Value::Int(self.id)),
            Column::TypeBase => Some(Value::Text(self.base.clone())),
            Column::TypeFragment => Some(Value::from(self.fragment.clone())),
            _ => None,
        }
    }
}

impl Row for Entity {
    fn value(&self, column: Column) -> Option<Value> {
        match column {
            Column::EntityId => Some(Value::Int(self.id)),
            Column::EntityEntity => Some(Value::Text(self.entity.clone())),
            _ => None,
        }
    }
}

impl Row for Mention {
    fn value(&self, column: Column) -> Option<Value> {
        match column {
            Column::MentionPostId => Some(Value::Int(self.post_id)),
            Column::MentionEntityId => Some(Value::Int(self.entity_id)),
            Column::MentionPost => Some(Value::from(self.post.clone())),
            _ => None,
        }
    }
}

/// A post joined with one of its mentions.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRow<'a, L: Row, R: Row> {
    pub left: &'a L,
    pub right: Option<&'a R>,
}

impl<L: Row, R: Row> Row for JoinedRow<'_, L, R> {
    fn value(&self, column: Column) -> Option<Value> {
        self.left
            .value(column)
            .or_else(|| self.right.and_then(|r| r.value(column)))
    }
}
