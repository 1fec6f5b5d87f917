//! In-memory operator evaluation.
//!
//! Each operator is a pure function of a document's field value and a parsed
//! literal. Dispatch is a match over [`Operator`], then over the
//! ([`FieldValue`], [`Literal`]) pair, so every supported combination is
//! visible here and anything else is a typed `UnsupportedOperator` error
//! rather than a silent `false`.
//!
//! | Operator | String | Array (any element) | Date | Int |
//! |---|---|---|---|---|
//! | equals | exact, case-sensitive | exact | instant equality | numeric |
//! | contains | case-insensitive substring | case-insensitive substring | - | - |
//! | in | exact match against list | any element in list | - | - |
//! | greater / less | - | - | after / before | `>` / `<` |
//! | gte / lte | - | - | equals or greater/less | equals or greater/less |
//! | regex | pattern match | - | - | - |
//!
//! Absent dates never match.

use crate::criteria::{Literal, Operator};
use crate::error::{Error, Result};
use crate::models::FieldValue;

/// Case folding shared by every backend for `contains`.
///
/// The relational backend stores values folded with this exact function, so
/// case-insensitive matching agrees across backends beyond ASCII.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Evaluate one operator against a field value.
pub fn evaluate(op: Operator, value: FieldValue<'_>, literal: &Literal) -> Result<bool> {
    match op {
        Operator::Equals => equals(value, literal),
        Operator::Contains => contains(value, literal),
        Operator::In => is_in(value, literal),
        Operator::Greater => greater(value, literal),
        Operator::Less => less(value, literal),
        Operator::Gte => Ok(equals(value, literal)? || greater(value, literal)?),
        Operator::Lte => Ok(equals(value, literal)? || less(value, literal)?),
        Operator::Regex => regex(value, literal),
    }
}

fn unsupported(op: Operator, value: FieldValue<'_>) -> Error {
    Error::UnsupportedOperator {
        target: value.kind().to_string(),
        operator: op.to_string(),
    }
}

fn equals(value: FieldValue<'_>, literal: &Literal) -> Result<bool> {
    match (value, literal) {
        (FieldValue::Text(v), Literal::Text(l)) => Ok(v == l),
        (FieldValue::List(items), Literal::Text(l)) => Ok(items.iter().any(|item| item == l)),
        (FieldValue::Instant(v), Literal::Instant(l)) => Ok(v.is_some_and(|v| v == *l)),
        (FieldValue::Int(v), Literal::Int(l)) => Ok(v == *l),
        (FieldValue::Bool(v), Literal::Bool(l)) => Ok(v == *l),
        _ => Err(unsupported(Operator::Equals, value)),
    }
}

fn contains(value: FieldValue<'_>, literal: &Literal) -> Result<bool> {
    match (value, literal) {
        (FieldValue::Text(v), Literal::Text(l)) => Ok(fold_case(v).contains(&fold_case(l))),
        (FieldValue::List(items), Literal::Text(l)) => {
            let needle = fold_case(l);
            Ok(items.iter().any(|item| fold_case(item).contains(&needle)))
        }
        _ => Err(unsupported(Operator::Contains, value)),
    }
}

fn is_in(value: FieldValue<'_>, literal: &Literal) -> Result<bool> {
    match (value, literal) {
        (FieldValue::Text(v), Literal::List(list)) => Ok(list.iter().any(|l| l == v)),
        (FieldValue::List(items), Literal::List(list)) => {
            Ok(items.iter().any(|item| list.contains(item)))
        }
        _ => Err(unsupported(Operator::In, value)),
    }
}

fn greater(value: FieldValue<'_>, literal: &Literal) -> Result<bool> {
    match (value, literal) {
        (FieldValue::Instant(v), Literal::Instant(l)) => Ok(v.is_some_and(|v| v > *l)),
        (FieldValue::Int(v), Literal::Int(l)) => Ok(v > *l),
        _ => Err(unsupported(Operator::Greater, value)),
    }
}

fn less(value: FieldValue<'_>, literal: &Literal) -> Result<bool> {
    match (value, literal) {
        (FieldValue::Instant(v), Literal::Instant(l)) => Ok(v.is_some_and(|v| v < *l)),
        (FieldValue::Int(v), Literal::Int(l)) => Ok(v < *l),
        _ => Err(unsupported(Operator::Less, value)),
    }
}

fn regex(value: FieldValue<'_>, literal: &Literal) -> Result<bool> {
    match (value, literal) {
        (FieldValue::Text(v), Literal::Pattern(re)) => Ok(re.is_match(v)),
        _ => Err(unsupported(Operator::Regex, value)),
    }
}
