//! Resolve stage: names to ids, before the main query is built.
//!
//! Produces a [`Resolved`] mapping that the builder consumes read-only. Type
//! and mention lookups are each a single batched call and run one after the
//! other; the main query depends on both.

use crate::FeedRequest;
use feedline_core::{FeedResult, RowId};
use feedline_storage::{MentionResolver, TypeResolver};
use std::collections::HashMap;

/// Ids the builder needs, keyed the way the request names them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// `None` when the request has no type filter
    pub type_ids: Option<Vec<RowId>>,
    /// Only entities that exist; missing ones never match
    pub mention_entities: HashMap<String, RowId>,
}

impl Resolved {
    pub fn mention_entity(&self, entity: &str) -> Option<RowId> {
        self.mention_entities.get(entity).copied()
    }
}

/// Run the lookups `request` needs.
pub async fn resolve(
    request: &FeedRequest,
    types: &dyn TypeResolver,
    mentions: &dyn MentionResolver,
) -> FeedResult<Resolved> {
    let mut resolved = Resolved::default();

    if let Some(requested) = &request.types {
        let ids = types.resolve_types(requested).await?;
        if ids.is_empty() {
            tracing::debug!(requested = requested.len(), "No stored type matches the type filter");
        }
        resolved.type_ids = Some(ids);
    }

    let entities = request.mention_entities();
    if !entities.is_empty() {
        resolved.mention_entities = mentions.resolve_entities(&entities).await?;
        if resolved.mention_entities.len() < entities.len() {
            tracing::debug!(
                requested = entities.len(),
                resolved = resolved.mention_entities.len(),
                "Some mentioned entities are unknown"
            );
        }
    }

    Ok(resolved)
}
