//! In-memory evaluation of query specs.
//!
//! Walks a condition tree against rows that implement [`Row`], consuming
//! bindings in depth-first order. Every child of an `AND`/`OR` node is
//! visited even after the outcome is known, so the binding cursor stays
//! aligned with the tree.

use feedline_core::{
    Condition, Direction, FeedResult, InternalError, Predicate, QuerySpec, Row, SortKey,
    StorageError, Value,
};
use std::cmp::Ordering;

/// Whether `row` satisfies the spec's condition.
pub fn matches<R: Row>(row: &R, spec: &QuerySpec) -> FeedResult<bool> {
    let Some(condition) = &spec.condition else {
        return if spec.bindings.is_empty() {
            Ok(true)
        } else {
            Err(InternalError::BindingMismatch {
                placeholders: 0,
                bindings: spec.bindings.len(),
            }
            .into())
        };
    };

    let mut cursor = BindingCursor::new(&spec.bindings, condition.placeholder_count());
    let result = eval(row, condition, &mut cursor)?;
    cursor.finish()?;
    Ok(result)
}

/// Rows satisfying the spec's condition, in input order.
pub fn filter_rows<R: Row>(rows: impl IntoIterator<Item = R>, spec: &QuerySpec) -> FeedResult<Vec<R>> {
    let mut out = Vec::new();
    for row in rows {
        if matches(&row, spec)? {
            out.push(row);
        }
    }
    Ok(out)
}

/// Stable sort by `keys`.
pub fn sort_rows<R: Row>(rows: &mut [R], keys: &[SortKey]) {
    rows.sort_by(|a, b| {
        for key in keys {
            let ordering = match (a.value(key.column), b.value(key.column)) {
                (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            let ordering = match key.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

struct BindingCursor<'a> {
    bindings: &'a [Value],
    /// Placeholders in the whole tree
    placeholders: usize,
    position: usize,
}

impl<'a> BindingCursor<'a> {
    fn new(bindings: &'a [Value], placeholders: usize) -> Self {
        Self {
            bindings,
            placeholders,
            position: 0,
        }
    }

    fn mismatch(&self) -> InternalError {
        InternalError::BindingMismatch {
            placeholders: self.placeholders,
            bindings: self.bindings.len(),
        }
    }

    fn next(&mut self) -> FeedResult<&'a Value> {
        let value = self.bindings.get(self.position).ok_or_else(|| self.mismatch())?;
        self.position += 1;
        Ok(value)
    }

    fn finish(&self) -> FeedResult<()> {
        if self.position != self.bindings.len() {
            return Err(self.mismatch().into());
        }
        Ok(())
    }
}

fn eval<R: Row>(row: &R, condition: &Condition, cursor: &mut BindingCursor<'_>) -> FeedResult<bool> {
    match condition {
        Condition::Leaf(predicate) => eval_leaf(row, predicate, cursor),
        Condition::And(children) => {
            let mut all = true;
            for child in children {
                all &= eval(row, child, cursor)?;
            }
            Ok(all)
        }
        Condition::Or(children) => {
            let mut any = false;
            for child in children {
                any |= eval(row, child, cursor)?;
            }
            Ok(any)
        }
    }
}

fn eval_leaf<R: Row>(row: &R, predicate: &Predicate, cursor: &mut BindingCursor<'_>) -> FeedResult<bool> {
    let position = cursor.position;
    match predicate {
        Predicate::Never => Ok(false),
        Predicate::IsNull { column } => Ok(cell(row, *column)?.is_null()),
        Predicate::Compare { column, op } => {
            let bound = cursor.next()?;
            if matches!(bound, Value::List(_)) {
                return Err(InternalError::BindingShape {
                    position,
                    reason: format!("{} expects a scalar, got a list", column),
                }
                .into());
            }
            let value = cell(row, *column)?;
            Ok(value
                .compare(bound)
                .map(|ordering| op.accepts(ordering))
                .unwrap_or(false))
        }
        Predicate::In { column } => {
            let Value::List(items) = cursor.next()? else {
                return Err(InternalError::BindingShape {
                    position,
                    reason: format!("{} IN expects a list", column),
                }
                .into());
            };
            let value = cell(row, *column)?;
            Ok(items
                .iter()
                .any(|item| value.compare(item) == Some(Ordering::Equal)))
        }
    }
}

/// Value of `column` in `row`; an unknown column is a storage failure.
pub(crate) fn cell<R: Row>(row: &R, column: feedline_core::Column) -> FeedResult<Value> {
    row.value(column).ok_or_else(|| {
        StorageError::QueryFailed {
            table: column.table().to_string(),
            reason: format!("unknown column {}", column),
        }
        .into()
    })
}
