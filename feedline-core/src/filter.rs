//! Condition trees for feed queries
//!
//! A condition is a tree of typed predicate leaves joined by `AND`/`OR`
//! nodes. Leaves carry positional placeholders; the bound values live in a
//! separate list that is read in the same depth-first order the tree is
//! walked. [`Clause`] keeps a condition and its bindings together while the
//! tree is being assembled, so combining clauses can never misalign them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// TABLES & COLUMNS
// ============================================================================

/// Relations a feed query can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Posts,
    Mentions,
    Types,
    Entities,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Posts => "posts",
            Table::Mentions => "mentions",
            Table::Types => "types",
            Table::Entities => "entities",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every column a condition, join or sort key may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    PostId,
    PostUserId,
    PostEntity,
    PostTypeId,
    PostPublishedAt,
    PostReceivedAt,
    PostVersion,
    PostVersionPublishedAt,
    PostVersionReceivedAt,
    PostPublic,
    MentionPostId,
    MentionEntityId,
    MentionPost,
    TypeId,
    TypeBase,
    TypeFragment,
    EntityId,
    EntityEntity,
}

impl Column {
    /// Relation the column belongs to.
    pub fn table(&self) -> Table {
        match self {
            Column::PostId
            | Column::PostUserId
            | Column::PostEntity
            | Column::PostTypeId
            | Column::PostPublishedAt
            | Column::PostReceivedAt
            | Column::PostVersion
            | Column::PostVersionPublishedAt
            | Column::PostVersionReceivedAt
            | Column::PostPublic => Table::Posts,
            Column::MentionPostId | Column::MentionEntityId | Column::MentionPost => {
                Table::Mentions
            }
            Column::TypeId | Column::TypeBase | Column::TypeFragment => Table::Types,
            Column::EntityId | Column::EntityEntity => Table::Entities,
        }
    }

    /// Unqualified column name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::PostId | Column::TypeId | Column::EntityId => "id",
            Column::PostUserId => "user_id",
            Column::PostEntity | Column::EntityEntity => "entity",
            Column::PostTypeId => "type_id",
            Column::PostPublishedAt => "published_at",
            Column::PostReceivedAt => "received_at",
            Column::PostVersion => "version",
            Column::PostVersionPublishedAt => "version_published_at",
            Column::PostVersionReceivedAt => "version_received_at",
            Column::PostPublic => "public",
            Column::MentionPostId => "post_id",
            Column::MentionEntityId => "entity_id",
            Column::MentionPost => "post",
            Column::TypeBase => "base",
            Column::TypeFragment => "fragment",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table().name(), self.name())
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// A bound parameter or a row cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Bool(bool),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    /// Ordering between two scalars of the same kind.
    ///
    /// `None` for mismatched kinds, `NULL`, and lists: comparisons against
    /// those never match, as in SQL.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        v.map(Value::Text).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// Comparison operator for a single-placeholder leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    /// Whether `lhs.cmp(rhs) == ordering` satisfies this operator.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A condition leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// `column <op> ?`
    Compare { column: Column, op: CompareOp },
    /// `column IN ?`, bound to a list
    In { column: Column },
    /// `column IS NULL`
    IsNull { column: Column },
    /// Matches nothing. Used where a filter resolved to no ids.
    Never,
}

impl Predicate {
    /// Number of placeholders this leaf consumes.
    pub fn placeholders(&self) -> usize {
        match self {
            Predicate::Compare { .. } | Predicate::In { .. } => 1,
            Predicate::IsNull { .. } | Predicate::Never => 0,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { column, op } => write!(f, "{} {} ?", column, op.symbol()),
            Predicate::In { column } => write!(f, "{} IN ?", column),
            Predicate::IsNull { column } => write!(f, "{} IS NULL", column),
            Predicate::Never => f.write_str("FALSE"),
        }
    }
}

// ============================================================================
// CONDITION TREE
// ============================================================================

/// Boolean condition tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Leaf(Predicate),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    /// Placeholders in the whole tree.
    pub fn placeholder_count(&self) -> usize {
        match self {
            Condition::Leaf(p) => p.placeholders(),
            Condition::And(children) | Condition::Or(children) => {
                children.iter().map(Condition::placeholder_count).sum()
            }
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::And(children) | Condition::Or(children) if children.len() > 1 => {
                write!(f, "({})", self)
            }
            _ => write!(f, "{}", self),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (children, sep, empty) = match self {
            Condition::Leaf(p) => return write!(f, "{}", p),
            Condition::And(children) => (children, " AND ", "TRUE"),
            Condition::Or(children) => (children, " OR ", "FALSE"),
        };
        if children.is_empty() {
            return f.write_str(empty);
        }
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            child.fmt_child(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// CLAUSES
// ============================================================================

/// A condition paired with the bindings for its placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub condition: Condition,
    pub bindings: Vec<Value>,
}

impl Clause {
    /// `column <op> ?`
    pub fn compare(column: Column, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            condition: Condition::Leaf(Predicate::Compare { column, op }),
            bindings: vec![value.into()],
        }
    }

    /// `column = ?`
    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    /// `column IN ?`
    pub fn is_in<T: Into<Value>>(column: Column, values: Vec<T>) -> Self {
        Self {
            condition: Condition::Leaf(Predicate::In { column }),
            bindings: vec![Value::from(values)],
        }
    }

    /// `column IS NULL`
    pub fn is_null(column: Column) -> Self {
        Self {
            condition: Condition::Leaf(Predicate::IsNull { column }),
            bindings: Vec::new(),
        }
    }

    /// Constant false.
    pub fn never() -> Self {
        Self {
            condition: Condition::Leaf(Predicate::Never),
            bindings: Vec::new(),
        }
    }

    /// Conjunction; bindings concatenated in child order.
    pub fn all(clauses: Vec<Clause>) -> Self {
        let (children, bindings) = Self::split(clauses);
        Self {
            condition: Condition::And(children),
            bindings,
        }
    }

    /// Disjunction; bindings concatenated in child order.
    pub fn any(clauses: Vec<Clause>) -> Self {
        let (children, bindings) = Self::split(clauses);
        Self {
            condition: Condition::Or(children),
            bindings,
        }
    }

    fn split(clauses: Vec<Clause>) -> (Vec<Condition>, Vec<Value>) {
        let mut children = Vec::with_capacity(clauses.len());
        let mut bindings = Vec::new();
        for clause in clauses {
            children.push(clause.condition);
            bindings.extend(clause.bindings);
        }
        (children, bindings)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_display_is_qualified() {
        assert_eq!(Column::PostUserId.to_string(), "posts.user_id");
        assert_eq!(Column::MentionEntityId.to_string(), "mentions.entity_id");
        assert_eq!(Column::TypeFragment.to_string(), "types.fragment");
        assert_eq!(Column::EntityEntity.to_string(), "entities.entity");
    }

    #[test]
    fn test_condition_display_nesting() {
        let clause = Clause::all(vec![
            Clause::eq(Column::PostUserId, 1i64),
            Clause::any(vec![
                Clause::eq(Column::MentionEntityId, 2i64),
                Clause::all(vec![
                    Clause::eq(Column::MentionEntityId, 3i64),
                    Clause::eq(Column::MentionPost, "p"),
                ]),
            ]),
        ]);
        assert_eq!(
            clause.condition.to_string(),
            "posts.user_id = ? AND (mentions.entity_id = ? OR \
             (mentions.entity_id = ? AND mentions.post = ?))"
        );
        assert_eq!(
            clause.bindings,
            vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Text("p".into())
            ]
        );
    }

    #[test]
    fn test_single_child_nodes_render_without_parens() {
        let clause = Clause::all(vec![
            Clause::eq(Column::PostUserId, 1i64),
            Clause::any(vec![Clause::eq(Column::MentionEntityId, 2i64)]),
        ]);
        assert_eq!(
            clause.condition.to_string(),
            "posts.user_id = ? AND mentions.entity_id = ?"
        );
    }

    #[test]
    fn test_empty_nodes_render_as_constants() {
        assert_eq!(Condition::And(vec![]).to_string(), "TRUE");
        assert_eq!(Condition::Or(vec![]).to_string(), "FALSE");
    }

    #[test]
    fn test_placeholder_count_matches_bindings() {
        let clause = Clause::all(vec![
            Clause::is_in(Column::PostTypeId, vec![1i64, 2, 3]),
            Clause::is_null(Column::TypeFragment),
            Clause::never(),
            Clause::compare(Column::PostReceivedAt, CompareOp::Gt, 10i64),
        ]);
        assert_eq!(clause.condition.placeholder_count(), 2);
        assert_eq!(clause.bindings.len(), 2);
        assert_eq!(
            clause.bindings[0],
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_value_compare() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
        assert_eq!(
            Value::Text("b".into()).compare(&Value::Text("a".into())),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(1).compare(&Value::Text("1".into())), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_compare_op_accepts() {
        assert!(CompareOp::Gte.accepts(Ordering::Equal));
        assert!(CompareOp::Gte.accepts(Ordering::Greater));
        assert!(!CompareOp::Gt.accepts(Ordering::Equal));
        assert!(CompareOp::Lte.accepts(Ordering::Less));
        assert!(!CompareOp::Lt.accepts(Ordering::Equal));
    }

    #[test]
    fn test_value_json_shape_is_untagged() {
        let v = Value::from(vec!["a", "b"]);
        assert_eq!(serde_json::to_value(&v).unwrap(), serde_json::json!(["a", "b"]));
        let parsed: Value = serde_json::from_str("null").unwrap();
        assert!(parsed.is_null());
    }
}
