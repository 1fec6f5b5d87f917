//! Filter-to-SQL compilation for the relational backend.
//!
//! A [`ValidatedFilter`] is compiled into one WHERE clause over
//! `metadata_document d` plus its positional parameters. The include/exclude
//! combination is reproduced in SQL: every exclude becomes `NOT (...)` and is
//! AND-ed in, the includes are joined by the filter's logic inside one group.
//!
//! Array fields compile to an `EXISTS` probe against `metadata_value`, scalar
//! fields compare columns directly, and `contains` matches against `*_fold`
//! shadow columns with a literal folded by [`fold_case`], so case-insensitive
//! matching is byte-for-byte the same as the in-memory evaluator.
//!
//! Dates are stored as a `(seconds, subsecond nanoseconds)` column pair and
//! compared as a SQL row value, which orders exactly like the instants and
//! covers every instant a document can hold.
//!
//! `regex` has no compiled form and fails with
//! [`Error::UnsupportedCompilation`] instead of being dropped or approximated.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

use folio_core::{
    fold_case, Error, Literal, Logic, Operator, Result, ValidatedCriterion, ValidatedFilter,
    ValueType,
};

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// String parameter.
    Text(String),
    /// Integer parameter (sizes, instant parts).
    Int(i64),
    /// Boolean parameter.
    Bool(bool),
}

/// Bind parameters in order onto a query.
pub fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [QueryParam],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            QueryParam::Text(s) => query.bind(s.as_str()),
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Bool(b) => query.bind(*b),
        };
    }
    query
}

/// Instant as `(seconds since epoch, subsecond nanoseconds)`.
///
/// Tuples compare in the same order as the instants, including before 1970
/// where the seconds are negative and the nanoseconds stay positive.
pub fn instant_parts(instant: &DateTime<Utc>) -> (i64, i64) {
    (
        instant.timestamp(),
        i64::from(instant.timestamp_subsec_nanos()),
    )
}

/// Rebuild an instant from its stored parts.
pub fn instant_from_parts(secs: i64, nanos: i64) -> Result<DateTime<Utc>> {
    u32::try_from(nanos)
        .ok()
        .and_then(|nanos| Utc.timestamp_opt(secs, nanos).single())
        .ok_or_else(|| {
            Error::InvalidValue(format!(
                "stored timestamp ({}, {}) is not a valid instant",
                secs, nanos
            ))
        })
}

fn comparison(op: Operator) -> Option<&'static str> {
    match op {
        Operator::Equals => Some("="),
        Operator::Greater => Some(">"),
        Operator::Less => Some("<"),
        Operator::Gte => Some(">="),
        Operator::Lte => Some("<="),
        _ => None,
    }
}

/// Generates the WHERE clause for a validated filter.
///
/// # Example
///
/// ```
/// use folio_core::{Criterion, FieldRegistry, FilterConfig, Logic};
/// use folio_db::predicate::{FilterQueryBuilder, QueryParam};
///
/// let filter = FilterConfig::new(Logic::And)
///     .with_criterion(Criterion::include("status", "equals", "published"))
///     .with_criterion(Criterion::exclude("tags", "contains", "Draft"))
///     .validate(FieldRegistry::standard())
///     .unwrap();
///
/// let (sql, params) = FilterQueryBuilder::new(&filter, 0).build().unwrap();
/// assert!(sql.starts_with("NOT (EXISTS"));
/// assert_eq!(params[0], QueryParam::Text("draft".to_string()));
/// ```
pub struct FilterQueryBuilder<'a> {
    filter: &'a ValidatedFilter,
    param_offset: usize,
}

impl<'a> FilterQueryBuilder<'a> {
    /// Create a builder.
    ///
    /// * `filter` - validated filter to compile
    /// * `param_offset` - number of parameters already in the enclosing query
    pub fn new(filter: &'a ValidatedFilter, param_offset: usize) -> Self {
        Self {
            filter,
            param_offset,
        }
    }

    /// Build the complete WHERE clause.
    ///
    /// Returns the SQL text and its parameters in placeholder order. An empty
    /// filter yields `"1"` (match everything).
    pub fn build(&self) -> Result<(String, Vec<QueryParam>)> {
        let mut params = Vec::new();
        let mut clauses = Vec::new();

        for criterion in self.filter.excludes() {
            let fragment = self.compile(criterion, &mut params)?;
            clauses.push(format!("NOT ({})", fragment));
        }

        let includes = self
            .filter
            .includes()
            .map(|c| self.compile(c, &mut params))
            .collect::<Result<Vec<_>>>()?;
        if !includes.is_empty() {
            let joiner = match self.filter.logic {
                Logic::And => " AND ",
                Logic::Or => " OR ",
            };
            clauses.push(format!("({})", includes.join(joiner)));
        }

        if clauses.is_empty() {
            return Ok(("1".to_string(), params));
        }
        Ok((clauses.join(" AND "), params))
    }

    fn placeholder(&self, params: &mut Vec<QueryParam>, param: QueryParam) -> String {
        params.push(param);
        format!("?{}", self.param_offset + params.len())
    }

    fn placeholders(&self, params: &mut Vec<QueryParam>, items: &[String]) -> String {
        items
            .iter()
            .map(|item| self.placeholder(params, QueryParam::Text(item.clone())))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Compile one criterion into a fragment that is never SQL NULL.
    fn compile(&self, criterion: &ValidatedCriterion, params: &mut Vec<QueryParam>) -> Result<String> {
        let field = criterion.field;
        let op = criterion.operator;
        let column = field.column;

        if op == Operator::Regex {
            return Err(Error::UnsupportedCompilation(format!(
                "regex on field '{}' is not supported by the relational backend",
                field.name
            )));
        }

        let fragment = match (field.value_type, op, &criterion.literal) {
            (ValueType::Array, Operator::Equals, Literal::Text(value)) => {
                let p = self.placeholder(params, QueryParam::Text(value.clone()));
                exists_value(column, &format!("v.value = {}", p))
            }
            (ValueType::Array, Operator::Contains, Literal::Text(value)) => {
                let p = self.placeholder(params, QueryParam::Text(fold_case(value)));
                exists_value(column, &format!("instr(v.value_fold, {}) > 0", p))
            }
            (ValueType::Array, Operator::In, Literal::List(items)) => {
                let list = self.placeholders(params, items);
                exists_value(column, &format!("v.value IN ({})", list))
            }

            (ValueType::String, Operator::Equals, Literal::Text(value)) => {
                let p = self.placeholder(params, QueryParam::Text(value.clone()));
                format!("d.{} = {}", column, p)
            }
            (ValueType::String, Operator::Contains, Literal::Text(value)) => {
                let p = self.placeholder(params, QueryParam::Text(fold_case(value)));
                format!("instr(d.{}_fold, {}) > 0", column, p)
            }
            (ValueType::String, Operator::In, Literal::List(items)) => {
                let list = self.placeholders(params, items);
                format!("d.{} IN ({})", column, list)
            }

            (ValueType::Int, _, Literal::Int(value)) if comparison(op).is_some() => {
                let p = self.placeholder(params, QueryParam::Int(*value));
                format!("d.{} {} {}", column, comparison(op).unwrap_or("="), p)
            }

            // Absent instants are NULL and must read as "no match" even under NOT.
            (ValueType::Date, _, Literal::Instant(instant)) if comparison(op).is_some() => {
                let (secs, nanos) = instant_parts(instant);
                let secs = self.placeholder(params, QueryParam::Int(secs));
                let nanos = self.placeholder(params, QueryParam::Int(nanos));
                format!(
                    "(d.{col} IS NOT NULL AND (d.{col}, d.{col}_ns) {cmp} ({secs}, {nanos}))",
                    col = column,
                    cmp = comparison(op).unwrap_or("="),
                    secs = secs,
                    nanos = nanos
                )
            }

            (ValueType::Bool, Operator::Equals, Literal::Bool(value)) => {
                let p = self.placeholder(params, QueryParam::Bool(*value));
                format!("d.{} = {}", column, p)
            }

            (value_type, op, _) => {
                return Err(Error::UnsupportedCompilation(format!(
                    "operator '{}' on {} field '{}'",
                    op,
                    value_type.as_str(),
                    field.name
                )))
            }
        };

        Ok(fragment)
    }
}

fn exists_value(column: &str, condition: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM metadata_value v WHERE v.path = d.path AND v.field = '{}' AND {})",
        column, condition
    )
}
