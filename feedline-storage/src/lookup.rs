//! Lookup queries used by the resolve stage.
//!
//! Both lookups are single batched queries: one over `types`, one over
//! `entities`, regardless of how many names the request carries.

use feedline_core::{Clause, Column, FragmentMatch, QuerySpec, SortKey, Table, TypeUri};

/// `types` lookup: an OR of `base = ? [AND fragment = ? | AND fragment IS NULL]`
/// per requested type.
pub fn type_lookup_spec(types: &[TypeUri]) -> QuerySpec {
    let per_type = types
        .iter()
        .map(|ty| {
            let mut parts = vec![Clause::eq(Column::TypeBase, ty.base.as_str())];
            match &ty.fragment {
                FragmentMatch::Any => {}
                FragmentMatch::Absent => parts.push(Clause::is_null(Column::TypeFragment)),
                FragmentMatch::Exact(fragment) => {
                    parts.push(Clause::eq(Column::TypeFragment, fragment.as_str()))
                }
            }
            Clause::all(parts)
        })
        .collect();

    let mut spec = QuerySpec::new(Table::Types).with_clause(Clause::any(per_type));
    spec.select = vec![Column::TypeId];
    spec.sort = vec![SortKey::asc(Column::TypeId)];
    spec
}

/// `entities` lookup: `entity IN ?` over every requested identifier.
pub fn entity_lookup_spec(entities: &[String]) -> QuerySpec {
    let mut spec =
        QuerySpec::new(Table::Entities).with_clause(Clause::is_in(Column::EntityEntity, entities.to_vec()));
    spec.select = vec![Column::EntityId, Column::EntityEntity];
    spec.sort = vec![SortKey::asc(Column::EntityId)];
    spec
}
