//! Predicate builder: request + resolved ids -> posts query.

use crate::{FeedRequest, MentionToken, Resolved};
use feedline_core::{
    Clause, Column, FeedResult, Join, QuerySpec, RowId, SortKey, Table,
};
use serde::{Deserialize, Serialize};

/// Who is reading whose feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewer {
    /// Owner of the feed being read
    pub owner_user_id: RowId,
    /// Unauthenticated viewers only see public posts
    pub authenticated: bool,
}

impl Viewer {
    pub fn owner(owner_user_id: RowId) -> Self {
        Self {
            owner_user_id,
            authenticated: true,
        }
    }

    pub fn anonymous(owner_user_id: RowId) -> Self {
        Self {
            owner_user_id,
            authenticated: false,
        }
    }
}

/// Assembles the filter part of a posts query.
///
/// Pure: equal inputs give structurally equal specs. Cursor ranges and the
/// over-fetch limit are added afterwards by [`crate::CursorPagination`].
#[derive(Debug, Clone, Copy)]
pub struct PredicateBuilder<'a> {
    request: &'a FeedRequest,
    resolved: &'a Resolved,
    viewer: Viewer,
}

impl<'a> PredicateBuilder<'a> {
    pub fn new(request: &'a FeedRequest, resolved: &'a Resolved, viewer: Viewer) -> Self {
        Self {
            request,
            resolved,
            viewer,
        }
    }

    pub fn build(&self) -> FeedResult<QuerySpec> {
        let mut spec = QuerySpec::new(Table::Posts);

        spec.sort = vec![SortKey::desc(self.request.sort_by.column())];

        if !self.viewer.authenticated {
            spec.and(Clause::eq(Column::PostPublic, true));
        }

        spec.and(Clause::eq(Column::PostUserId, self.viewer.owner_user_id));

        if self.request.types.is_some() {
            spec.and(self.type_clause());
        }

        if let Some(entities) = &self.request.entities {
            spec.and(Clause::is_in(Column::PostEntity, entities.clone()));
        }

        if let Some(groups) = &self.request.mentions {
            spec.joins.push(Join::inner(
                Table::Mentions,
                Column::MentionPostId,
                Column::PostId,
            ));
            spec.distinct = true;
            for group in groups {
                spec.and(self.mention_group_clause(group));
            }
        }

        spec.limit = Some(self.request.limit);

        crate::ensure_aligned(&spec)?;
        Ok(spec)
    }

    fn type_clause(&self) -> Clause {
        match &self.resolved.type_ids {
            Some(ids) if !ids.is_empty() => Clause::is_in(Column::PostTypeId, ids.clone()),
            // Nothing stored matches: the feed is empty, not an error.
            _ => Clause::never(),
        }
    }

    fn mention_group_clause(&self, group: &[MentionToken]) -> Clause {
        Clause::any(
            group
                .iter()
                .map(|token| match self.resolved.mention_entity(&token.entity) {
                    None => Clause::never(),
                    Some(entity_id) => match &token.post {
                        None => Clause::eq(Column::MentionEntityId, entity_id),
                        Some(post) => Clause::all(vec![
                            Clause::eq(Column::MentionEntityId, entity_id),
                            Clause::eq(Column::MentionPost, post.as_str()),
                        ]),
                    },
                })
                .collect(),
        )
    }
}
