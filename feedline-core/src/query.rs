//! Query specifications handed to the storage collaborator
//!
//! A [`QuerySpec`] is language-agnostic: a table, a condition tree with its
//! parallel binding list, joins, sort keys, a reverse flag and a row limit.
//! Storage backends compile it into whatever they speak.

use crate::{Clause, Column, Condition, FeedResult, InternalError, Table, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

/// One entry of the sort-column list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub column: Column,
    pub direction: Direction,
}

impl SortKey {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Desc,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        write!(f, "{} {}", self.column, dir)
    }
}

/// Join kind. Only inner joins are needed for feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
}

/// `<kind> JOIN <table> ON <left> = <right>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: Table,
    /// Column of the joined table
    pub left: Column,
    /// Column of the base table
    pub right: Column,
}

impl Join {
    pub fn inner(table: Table, left: Column, right: Column) -> Self {
        Self {
            kind: JoinKind::Inner,
            table,
            left,
            right,
        }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            JoinKind::Inner => write!(
                f,
                "INNER JOIN {} ON {} = {}",
                self.table, self.left, self.right
            ),
        }
    }
}

/// Everything the storage collaborator needs to run one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub table: Table,
    /// Empty selects every column
    pub select: Vec<Column>,
    /// Collapse rows duplicated by joins
    pub distinct: bool,
    /// `None` matches every row
    pub condition: Option<Condition>,
    /// Parallel to the placeholders of `condition` in traversal order
    pub bindings: Vec<Value>,
    pub joins: Vec<Join>,
    pub sort: Vec<SortKey>,
    /// Traverse the sort keys backwards
    pub reverse: bool,
    pub limit: Option<u32>,
}

impl QuerySpec {
    /// Empty query over `table`.
    pub fn new(table: Table) -> Self {
        Self {
            table,
            select: Vec::new(),
            distinct: false,
            condition: None,
            bindings: Vec::new(),
            joins: Vec::new(),
            sort: Vec::new(),
            reverse: false,
            limit: None,
        }
    }

    /// Install a clause as the whole condition.
    pub fn with_clause(mut self, clause: Clause) -> Self {
        self.condition = Some(clause.condition);
        self.bindings = clause.bindings;
        self
    }

    /// AND a clause onto the existing condition.
    ///
    /// A top-level `And` is extended in place so the tree stays flat.
    pub fn and(&mut self, clause: Clause) {
        self.bindings.extend(clause.bindings);
        self.condition = Some(match self.condition.take() {
            None => clause.condition,
            Some(Condition::And(mut children)) => {
                children.push(clause.condition);
                Condition::And(children)
            }
            Some(existing) => Condition::And(vec![existing, clause.condition]),
        });
    }

    /// Sort keys as actually traversed, with `reverse` applied.
    pub fn effective_sort(&self) -> Vec<SortKey> {
        self.sort
            .iter()
            .map(|key| SortKey {
                column: key.column,
                direction: if self.reverse {
                    key.direction.flipped()
                } else {
                    key.direction
                },
            })
            .collect()
    }

    /// Check the placeholder/binding invariant.
    pub fn validate(&self) -> FeedResult<()> {
        let placeholders = self
            .condition
            .as_ref()
            .map(Condition::placeholder_count)
            .unwrap_or(0);
        if placeholders != self.bindings.len() {
            return Err(InternalError::BindingMismatch {
                placeholders,
                bindings: self.bindings.len(),
            }
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        if self.select.is_empty() {
            write!(f, "{}.*", self.table)?;
        } else {
            let cols: Vec<String> = self.select.iter().map(|c| c.to_string()).collect();
            f.write_str(&cols.join(", "))?;
        }
        write!(f, " FROM {}", self.table)?;
        for join in &self.joins {
            write!(f, " {}", join)?;
        }
        if let Some(condition) = &self.condition {
            write!(f, " WHERE {}", condition)?;
        }
        let sort = self.effective_sort();
        if !sort.is_empty() {
            let keys: Vec<String> = sort.iter().map(|k| k.to_string()).collect();
            write!(f, " ORDER BY {}", keys.join(", "))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompareOp, FeedError};

    #[test]
    fn test_and_flattens_top_level() {
        let mut spec = QuerySpec::new(Table::Posts);
        spec.and(Clause::eq(Column::PostUserId, 1i64));
        spec.and(Clause::eq(Column::PostPublic, true));
        spec.and(Clause::is_in(Column::PostEntity, vec!["a", "b"]));

        match &spec.condition {
            Some(Condition::And(children)) => assert_eq!(children.len(), 3),
            other => panic!("expected flat AND, got {:?}", other),
        }
        assert_eq!(spec.bindings.len(), 3);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_and_wraps_nested_or() {
        let mut spec = QuerySpec::new(Table::Posts).with_clause(Clause::any(vec![
            Clause::eq(Column::PostUserId, 1i64),
            Clause::eq(Column::PostUserId, 2i64),
        ]));
        spec.and(Clause::eq(Column::PostPublic, true));
        assert_eq!(
            spec.condition.as_ref().map(|c| c.to_string()),
            Some("(posts.user_id = ? OR posts.user_id = ?) AND posts.public = ?".to_string())
        );
    }

    #[test]
    fn test_validate_detects_mismatch() {
        let mut spec = QuerySpec::new(Table::Posts);
        spec.and(Clause::eq(Column::PostUserId, 1i64));
        spec.bindings.push(Value::Int(99));

        match spec.validate() {
            Err(FeedError::Internal(InternalError::BindingMismatch {
                placeholders,
                bindings,
            })) => {
                assert_eq!(placeholders, 1);
                assert_eq!(bindings, 2);
            }
            other => panic!("expected binding mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_effective_sort_flips_when_reversed() {
        let mut spec = QuerySpec::new(Table::Posts);
        spec.sort = vec![
            SortKey::desc(Column::PostReceivedAt),
            SortKey::desc(Column::PostVersion),
        ];
        spec.reverse = true;
        let sort = spec.effective_sort();
        assert!(sort.iter().all(|k| k.direction == Direction::Asc));
    }

    #[test]
    fn test_display_renders_full_query() {
        let mut spec = QuerySpec::new(Table::Posts);
        spec.distinct = true;
        spec.joins.push(Join::inner(
            Table::Mentions,
            Column::MentionPostId,
            Column::PostId,
        ));
        spec.and(Clause::eq(Column::PostUserId, 1i64));
        spec.and(Clause::compare(
            Column::PostReceivedAt,
            CompareOp::Lt,
            100i64,
        ));
        spec.sort = vec![SortKey::desc(Column::PostReceivedAt)];
        spec.limit = Some(26);

        assert_eq!(
            spec.to_string(),
            "SELECT DISTINCT posts.* FROM posts \
             INNER JOIN mentions ON mentions.post_id = posts.id \
             WHERE posts.user_id = ? AND posts.received_at < ? \
             ORDER BY posts.received_at DESC LIMIT 26"
        );
    }
}
