//! Filter request model and validation.
//!
//! A [`FilterConfig`] is the request as it arrives on the wire: every part is
//! still a string. [`FilterConfig::validate`] resolves fields against the
//! registry, parses operators, actions and literals, and produces a
//! [`ValidatedFilter`] that both backends consume. Validation happens before
//! any backend is touched, so an invalid request executes nothing.
//!
//! # Example
//!
//! ```
//! use folio_core::{Criterion, FilterConfig, FieldRegistry, Logic};
//!
//! let config = FilterConfig::new(Logic::And)
//!     .with_criterion(Criterion::include("status", "equals", "published"))
//!     .with_criterion(Criterion::exclude("priority", "equals", "low"));
//!
//! let filter = config.validate(FieldRegistry::standard()).unwrap();
//! assert_eq!(filter.includes().count(), 1);
//! assert_eq!(filter.excludes().count(), 1);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::fields::{FieldDescriptor, FieldRegistry, ValueType};

// =============================================================================
// OPERATOR / ACTION / LOGIC
// =============================================================================

/// Comparison operator of a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Equals,
    Contains,
    In,
    Greater,
    Less,
    Gte,
    Lte,
    Regex,
}

impl Operator {
    /// Every operator, for exhaustive tests and listings.
    pub const ALL: &'static [Operator] = &[
        Operator::Equals,
        Operator::Contains,
        Operator::In,
        Operator::Greater,
        Operator::Less,
        Operator::Gte,
        Operator::Lte,
        Operator::Regex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::In => "in",
            Self::Greater => "greater",
            Self::Less => "less",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Regex => "regex",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| Error::UnsupportedOperator {
                target: "any field".to_string(),
                operator: s.to_string(),
            })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a matching criterion admits or rejects the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Include,
    Exclude,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How include criteria combine. Excludes are always AND-combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl FromStr for Logic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            _ => Err(Error::InvalidLogic(s.to_string())),
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WIRE MODEL
// =============================================================================

/// One filter condition as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Field name.
    pub metadata: String,
    pub operator: String,
    /// Literal, string-encoded (lists comma-separated, dates `YYYY-MM-DD` or RFC3339).
    pub value: String,
    #[serde(default = "default_action")]
    pub action: String,
}

fn default_action() -> String {
    Action::Include.as_str().to_string()
}

fn default_logic() -> String {
    Logic::And.as_str().to_string()
}

impl Criterion {
    pub fn new(
        metadata: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            metadata: metadata.into(),
            operator: operator.into(),
            value: value.into(),
            action: action.into(),
        }
    }

    pub fn include(
        metadata: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(metadata, operator, value, Action::Include.as_str())
    }

    pub fn exclude(
        metadata: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(metadata, operator, value, Action::Exclude.as_str())
    }

    /// Validate against the registry: field, operator, literal, then action.
    pub fn validate(&self, registry: &FieldRegistry) -> Result<ValidatedCriterion> {
        let field = registry.lookup(&self.metadata)?;

        let operator: Operator = self.operator.parse().map_err(|_| Error::UnsupportedOperator {
            target: format!("field '{}'", field.name),
            operator: self.operator.clone(),
        })?;
        if !field.supports(operator) {
            return Err(Error::UnsupportedOperator {
                target: format!("field '{}'", field.name),
                operator: operator.to_string(),
            });
        }

        let literal = Literal::parse(field.value_type, operator, &self.value)?;
        let action: Action = self.action.parse()?;

        Ok(ValidatedCriterion {
            field,
            operator,
            literal,
            action,
        })
    }
}

/// A whole filter request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    #[serde(default = "default_logic")]
    pub logic: String,
    /// Maximum documents returned; `0` (or negative) means unlimited.
    #[serde(default)]
    pub limit: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new(Logic::And)
    }
}

impl FilterConfig {
    pub fn new(logic: Logic) -> Self {
        Self {
            criteria: Vec::new(),
            logic: logic.as_str().to_string(),
            limit: defaults::UNLIMITED,
        }
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Validate logic and every criterion, tagging the failing index.
    pub fn validate(&self, registry: &FieldRegistry) -> Result<ValidatedFilter> {
        let logic: Logic = self.logic.parse()?;
        let criteria = self
            .criteria
            .iter()
            .enumerate()
            .map(|(index, c)| {
                c.validate(registry).map_err(|e| Error::InvalidCriterion {
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ValidatedFilter {
            criteria,
            logic,
            limit: usize::try_from(self.limit).ok().filter(|l| *l > 0),
        })
    }
}

// =============================================================================
// VALIDATED MODEL
// =============================================================================

/// A criterion literal parsed once for its field type and operator.
#[derive(Debug, Clone)]
pub enum Literal {
    Text(String),
    List(Vec<String>),
    Instant(DateTime<Utc>),
    Int(i64),
    Bool(bool),
    Pattern(Regex),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Instant(a), Self::Instant(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Literal {
    /// Parse a raw literal for a field type and operator.
    pub fn parse(value_type: ValueType, operator: Operator, raw: &str) -> Result<Self> {
        if operator == Operator::In {
            return parse_list(raw).map(Literal::List);
        }
        match value_type {
            ValueType::String | ValueType::Array => {
                if operator == Operator::Regex {
                    Regex::new(raw).map(Literal::Pattern).map_err(|e| {
                        Error::InvalidValue(format!("invalid regex '{}': {}", raw, e))
                    })
                } else {
                    Ok(Literal::Text(raw.to_string()))
                }
            }
            ValueType::Date => parse_instant(raw).map(Literal::Instant),
            ValueType::Int => raw
                .trim()
                .parse::<i64>()
                .map(Literal::Int)
                .map_err(|_| Error::InvalidValue(format!("'{}' is not an integer", raw))),
            ValueType::Bool => parse_bool(raw).map(Literal::Bool),
        }
    }
}

/// Split a comma-separated list, trimming whitespace and dropping empty items.
pub fn parse_list(raw: &str) -> Result<Vec<String>> {
    let items: Vec<String> = raw
        .split(defaults::LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if items.is_empty() {
        return Err(Error::InvalidValue(format!("'{}' has no list items", raw)));
    }
    Ok(items)
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC3339 timestamp.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, defaults::DATE_FORMAT) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidValue(format!("'{}' is not a date or timestamp", raw)))
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(Error::InvalidValue(format!("'{}' is not a boolean", raw))),
    }
}

/// A criterion resolved against the registry with its literal parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCriterion {
    pub field: FieldDescriptor,
    pub operator: Operator,
    pub literal: Literal,
    pub action: Action,
}

/// A filter request ready for execution by any backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFilter {
    pub criteria: Vec<ValidatedCriterion>,
    pub logic: Logic,
    /// `None` means unlimited.
    pub limit: Option<usize>,
}

impl ValidatedFilter {
    pub fn includes(&self) -> impl Iterator<Item = &ValidatedCriterion> {
        self.criteria
            .iter()
            .filter(|c| c.action == Action::Include)
    }

    pub fn excludes(&self) -> impl Iterator<Item = &ValidatedCriterion> {
        self.criteria
            .iter()
            .filter(|c| c.action == Action::Exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn registry() -> &'static FieldRegistry {
        FieldRegistry::standard()
    }

    #[test]
    fn test_operator_parse_is_lenient_on_case_and_space() {
        assert_eq!(" GTE ".parse::<Operator>().unwrap(), Operator::Gte);
        assert!("between".parse::<Operator>().is_err());
    }

    #[test]
    fn test_unknown_field_rejected_first() {
        let err = Criterion::include("colour", "bogus", "x")
            .validate(registry())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownField(_)));
    }

    #[test]
    fn test_unsupported_operator_for_field() {
        let err = Criterion::include("size", "contains", "1")
            .validate(registry())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOperator { ref operator, .. } if operator == "contains"
        ));

        let err = Criterion::include("tags", "regex", "a.*")
            .validate(registry())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_unknown_operator_name() {
        let err = Criterion::include("title", "startswith", "x")
            .validate(registry())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_invalid_literals() {
        for (field, op, value) in [
            ("createdAt", "greater", "yesterday"),
            ("size", "equals", "12kb"),
            ("title", "regex", "(unclosed"),
            ("tags", "in", " , ,"),
        ] {
            let err = Criterion::include(field, op, value)
                .validate(registry())
                .unwrap_err();
            assert!(
                matches!(err, Error::InvalidValue(_)),
                "{} {} {:?} gave {:?}",
                field,
                op,
                value,
                err
            );
        }
    }

    #[test]
    fn test_invalid_action_checked_after_value() {
        let err = Criterion::new("title", "equals", "x", "maybe")
            .validate(registry())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAction(a) if a == "maybe"));

        // A bad literal wins over a bad action.
        let err = Criterion::new("size", "equals", "x", "maybe")
            .validate(registry())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
    }

    #[test]
    fn test_in_list_is_trimmed() {
        let c = Criterion::include("status", "in", "a, b ,c")
            .validate(registry())
            .unwrap();
        assert_eq!(
            c.literal,
            Literal::List(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_date_literals() {
        let day = parse_instant("2024-05-01").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        let ts = parse_instant("2024-05-01T12:30:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_int_literal_accepts_sign_and_space() {
        let c = Criterion::include("size", "gte", " -42 ")
            .validate(registry())
            .unwrap();
        assert_eq!(c.literal, Literal::Int(-42));
    }

    #[test]
    fn test_bool_literals() {
        assert!(parse_bool("true").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn test_config_invalid_logic() {
        let mut config = FilterConfig::new(Logic::And);
        config.logic = "xor".to_string();
        let err = config.validate(registry()).unwrap_err();
        assert!(matches!(err, Error::InvalidLogic(_)));
    }

    #[test]
    fn test_config_tags_failing_index() {
        let config = FilterConfig::new(Logic::Or)
            .with_criterion(Criterion::include("title", "equals", "ok"))
            .with_criterion(Criterion::include("nope", "equals", "x"));
        let err = config.validate(registry()).unwrap_err();
        match err {
            Error::InvalidCriterion { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, Error::UnknownField(_)));
            }
            other => panic!("Expected InvalidCriterion, got {:?}", other),
        }
    }

    #[test]
    fn test_config_limit_normalization() {
        let filter = FilterConfig::default().validate(registry()).unwrap();
        assert_eq!(filter.limit, None);

        let filter = FilterConfig::default()
            .with_limit(-3)
            .validate(registry())
            .unwrap();
        assert_eq!(filter.limit, None);

        let filter = FilterConfig::default()
            .with_limit(5)
            .validate(registry())
            .unwrap();
        assert_eq!(filter.limit, Some(5));
    }

    #[test]
    fn test_wire_shape_deserializes() {
        let json = r#"{
            "criteria": [{"metadata":"tags","operator":"contains","value":"alpha","action":"include"}],
            "logic": "and", "limit": 0
        }"#;
        let config: FilterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.criteria.len(), 1);
        assert_eq!(config.criteria[0].metadata, "tags");

        let minimal: FilterConfig = serde_json::from_str(r#"{"criteria": []}"#).unwrap();
        assert_eq!(minimal.logic, "and");
        assert_eq!(minimal.limit, 0);
    }

    #[test]
    fn test_partition_by_action() {
        let filter = FilterConfig::new(Logic::And)
            .with_criterion(Criterion::include("title", "regex", "^a"))
            .with_criterion(Criterion::exclude("tags", "contains", "x"))
            .validate(registry())
            .unwrap();
        assert_eq!(filter.includes().count(), 1);
        assert_eq!(filter.excludes().count(), 1);
        assert_eq!(
            filter.includes().next().map(|c| c.operator),
            Some(Operator::Regex)
        );
    }
}
