//! Feedline Query - Feed Query Construction
//!
//! Turns raw feed parameters into a single posts query plus a plan for
//! post-processing its rows. The pipeline is
//! parse ([`FeedRequest`]) -> resolve ([`resolve()`]) -> build
//! ([`PredicateBuilder`]) -> paginate ([`CursorPagination`]).
//! Every stage before execution is pure apart from the two batched lookups
//! in the resolve stage.

pub mod builder;
pub mod pagination;
pub mod params;
pub mod request;
pub mod resolve;

pub use builder::{PredicateBuilder, Viewer};
pub use pagination::{CursorPagination, Page, PagePlan, Pagination};
pub use params::FeedParams;
pub use request::{FeedRequest, MentionToken, SortBy};
pub use resolve::{resolve, Resolved};

use feedline_core::{FeedResult, QuerySpec};

/// Build the executable posts query for an already-resolved request.
pub fn build_query(
    request: &FeedRequest,
    resolved: &Resolved,
    viewer: Viewer,
) -> FeedResult<(QuerySpec, PagePlan)> {
    let mut spec = PredicateBuilder::new(request, resolved, viewer).build()?;
    let plan = CursorPagination::new(request).apply(&mut spec)?;
    Ok((spec, plan))
}

/// Placeholder / binding check run after every stage that edits a spec.
pub(crate) fn ensure_aligned(spec: &QuerySpec) -> FeedResult<()> {
    spec.validate().map_err(|err| {
        tracing::error!(table = %spec.table, error = %err, "Query bindings out of step with placeholders");
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedline_core::{Column, SortKey, Value};

    #[test]
    fn test_build_query_combines_stages() {
        let request = FeedRequest::parse(
            &FeedParams::new()
                .with("entities", "https://a.example")
                .with("before", "500 v1")
                .with("limit", "3"),
            &feedline_core::FeedConfig::default(),
        )
        .unwrap();

        let (spec, plan) = build_query(&request, &Resolved::default(), Viewer::owner(2)).unwrap();
        assert_eq!(spec.limit, Some(4));
        assert_eq!(plan.limit, 3);
        assert_eq!(
            spec.sort,
            vec![
                SortKey::desc(Column::PostReceivedAt),
                SortKey::desc(Column::PostVersion)
            ]
        );
        assert_eq!(spec.bindings.len(), spec.condition.as_ref().unwrap().placeholder_count());
        assert_eq!(spec.bindings[0], Value::Int(2));
    }
}
