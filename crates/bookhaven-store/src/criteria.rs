//! # Criteria
//!
//! Structured query filters for the record store.
//!
//! ## Why Not Closures?
//! The store's query surface takes a `Criteria` value instead of a
//! predicate function. A criteria tree is plain data: it serializes, it
//! logs, and it can cross a process or wire boundary, none of which a
//! closure can do.
//!
//! ## Usage
//! ```rust
//! use bookhaven_store::criteria::Criteria;
//!
//! // user_id == "usr-1001" AND is_rental == true
//! let filter = Criteria::eq("user_id", "usr-1001")
//!     .and(Criteria::eq("is_rental", true));
//!
//! // category_ids array contains "cat-1002"
//! let in_category = Criteria::contains("category_ids", "cat-1002");
//! ```
//!
//! ## Matching Semantics
//! - `Eq`/`Ne`: value equality; integers and floats holding the same
//!   number are equal
//! - `Lt`/`Le`/`Gt`/`Ge`: numeric comparison for numbers, lexicographic
//!   for strings, no match for anything else
//! - `Contains`: substring match on strings, membership on arrays
//! - A field missing from the record never matches, whatever the operator

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Operator
// =============================================================================

/// Comparison operator of a criteria leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
}

// =============================================================================
// Criteria
// =============================================================================

/// A serializable filter over records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criteria {
    /// Matches every record.
    All,

    /// Compares one field against a value.
    Cmp {
        field: String,
        op: Op,
        value: Value,
    },

    /// Matches when every clause matches.
    And { clauses: Vec<Criteria> },

    /// Inverts a clause.
    Not { clause: Box<Criteria> },
}

impl Criteria {
    /// Builds a field comparison leaf.
    pub fn cmp(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Criteria::Cmp {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::cmp(field, Op::Eq, value)
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::cmp(field, Op::Ne, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::cmp(field, Op::Lt, value)
    }

    /// `field <= value`
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::cmp(field, Op::Le, value)
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::cmp(field, Op::Gt, value)
    }

    /// `field >= value`
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::cmp(field, Op::Ge, value)
    }

    /// Substring match on string fields, membership on array fields.
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::cmp(field, Op::Contains, value)
    }

    /// Combines this criteria with another; both must match.
    ///
    /// Flattens nested `And`s so builder chains stay shallow.
    pub fn and(self, other: Criteria) -> Self {
        let mut clauses = match self {
            Criteria::And { clauses } => clauses,
            other_self => vec![other_self],
        };
        match other {
            Criteria::And { clauses: mut more } => clauses.append(&mut more),
            leaf => clauses.push(leaf),
        }
        Criteria::And { clauses }
    }

    /// Inverts this criteria.
    pub fn negate(self) -> Self {
        Criteria::Not {
            clause: Box::new(self),
        }
    }

    /// Evaluates the criteria against a record row.
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        match self {
            Criteria::All => true,
            Criteria::Cmp { field, op, value } => match row.get(field) {
                Some(actual) if !actual.is_null() => compare(*op, actual, value),
                _ => false,
            },
            Criteria::And { clauses } => clauses.iter().all(|c| c.matches(row)),
            Criteria::Not { clause } => !clause.matches(row),
        }
    }
}

// =============================================================================
// Value Comparison
// =============================================================================

fn compare(op: Op, actual: &Value, expected: &Value) -> bool {
    match op {
        Op::Eq => values_equal(actual, expected),
        Op::Ne => !values_equal(actual, expected),
        Op::Lt | Op::Le | Op::Gt | Op::Ge => match ordering(actual, expected) {
            Some(ord) => match op {
                Op::Lt => ord.is_lt(),
                Op::Le => ord.is_le(),
                Op::Gt => ord.is_gt(),
                Op::Ge => ord.is_ge(),
                _ => unreachable!(),
            },
            None => false,
        },
        Op::Contains => contains(actual, expected),
    }
}

/// Equality with numeric normalization: `2` and `2.0` are the same value.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering for numbers (numeric) and strings (lexicographic).
fn ordering(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    None
}

/// Substring match for strings, membership for arrays.
fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(haystack) => expected
            .as_str()
            .map(|needle| haystack.contains(needle))
            .unwrap_or(false),
        Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
        _ => false,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
