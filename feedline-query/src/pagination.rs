//! Cursor pagination
//!
//! Translates `since` / `until` / `before` cursors into range predicates on
//! the sort timestamp, with `version` as the tie-break so rows that share a
//! timestamp are split consistently across pages. Also owns the over-fetch
//! policy: unless the request is a `since` sync, one row more than the page
//! size is fetched and its presence tells whether another page exists.

use crate::{FeedRequest, SortBy};
use feedline_core::{Clause, Column, CompareOp, CursorToken, FeedResult, Post, QuerySpec, SortKey};
use serde::{Deserialize, Serialize};

/// Outgoing navigation cursors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub next: Option<CursorToken>,
    pub previous: Option<CursorToken>,
}

/// How the executed rows must be post-processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePlan {
    pub sort_by: SortBy,
    /// Page size the client gets
    pub limit: u32,
    /// An extra row was requested
    pub check_beyond_limit: bool,
    /// Rows arrive oldest-first
    pub reverse: bool,
    /// Cursor echoed when a sync page comes back empty
    pub since: Option<CursorToken>,
    /// Cursor echoed when an empty page still has rows beyond it
    pub before: Option<CursorToken>,
}

impl PagePlan {
    pub fn cursor_for(&self, post: &Post) -> CursorToken {
        CursorToken::new(self.sort_by.timestamp_of(post), post.version.clone())
    }
}

/// A trimmed page in newest-first order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
    pub beyond_limit_exists: bool,
}

/// Cursor handling for one request.
#[derive(Debug, Clone, Copy)]
pub struct CursorPagination<'a> {
    request: &'a FeedRequest,
}

impl<'a> CursorPagination<'a> {
    pub fn new(request: &'a FeedRequest) -> Self {
        Self { request }
    }

    /// Add cursor ranges, the tie-break sort key and the executed limit.
    pub fn apply(&self, spec: &mut QuerySpec) -> FeedResult<PagePlan> {
        let request = self.request;
        let column = request.sort_by.column();

        if !spec.sort.iter().any(|key| key.column == Column::PostVersion) {
            spec.sort.push(SortKey::desc(Column::PostVersion));
        }

        if let Some(since) = &request.since {
            spec.and(after(column, since));
            spec.reverse = true;
        }
        if let Some(until) = &request.until {
            spec.and(after(column, until));
        }
        if let Some(before) = &request.before {
            spec.and(before_clause(column, before));
        }

        let check_beyond_limit = request.since.is_none();
        spec.limit = Some(if check_beyond_limit {
            request.limit.saturating_add(1)
        } else {
            request.limit
        });

        crate::ensure_aligned(spec)?;

        Ok(PagePlan {
            sort_by: request.sort_by,
            limit: request.limit,
            check_beyond_limit,
            reverse: spec.reverse,
            since: request.since.clone(),
            before: request.before.clone(),
        })
    }

    /// Drop the over-fetched row, build cursors and restore newest-first order.
    pub fn finish(plan: &PagePlan, mut rows: Vec<Post>) -> Page {
        let limit = plan.limit as usize;
        let beyond_limit_exists = plan.check_beyond_limit && rows.len() > limit;
        // With nothing kept, resume just above the first row left out.
        let resume = plan.before.clone().or_else(|| {
            rows.get(limit).map(|post| {
                CursorToken::at(plan.sort_by.timestamp_of(post).saturating_add(1))
            })
        });
        rows.truncate(limit);

        // First and last in traversal order.
        let previous = rows.first().map(|post| plan.cursor_for(post));
        let last = rows.last().map(|post| plan.cursor_for(post));
        let next = if plan.reverse {
            last.or_else(|| plan.since.clone())
        } else if beyond_limit_exists {
            last.or(resume)
        } else {
            None
        };

        if plan.reverse {
            rows.reverse();
        }

        Page {
            posts: rows,
            pagination: Pagination { next, previous },
            beyond_limit_exists,
        }
    }
}

/// Rows strictly after `cursor` in (timestamp, version) order.
fn after(column: Column, cursor: &CursorToken) -> Clause {
    match &cursor.version {
        None => Clause::compare(column, CompareOp::Gt, cursor.timestamp),
        Some(version) => Clause::any(vec![
            Clause::all(vec![
                Clause::compare(column, CompareOp::Gte, cursor.timestamp),
                Clause::compare(Column::PostVersion, CompareOp::Gt, version.as_str()),
            ]),
            Clause::compare(column, CompareOp::Gt, cursor.timestamp),
        ]),
    }
}

/// Rows strictly before `cursor` in (timestamp, version) order.
fn before_clause(column: Column, cursor: &CursorToken) -> Clause {
    match &cursor.version {
        None => Clause::compare(column, CompareOp::Lt, cursor.timestamp),
        Some(version) => Clause::any(vec![
            Clause::all(vec![
                Clause::compare(column, CompareOp::Lte, cursor.timestamp),
                Clause::compare(Column::PostVersion, CompareOp::Lt, version.as_str()),
            ]),
            Clause::compare(column, CompareOp::Lt, cursor.timestamp),
        ]),
    }
}
