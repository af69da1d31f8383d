//! The rule catalog: an addressable library of named correction rules.
//!
//! Rules are identified by a stable numeric id and are independent of any
//! column or profile; the same rule can be bound to many columns across many
//! profiles. The catalog is loaded once at startup (built-in set or a YAML
//! file) and treated as read-only for the session.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    data::{Row, Value},
    error::CorrectionError,
    transform::string_ops,
};

/// Guard predicate over the current row state. Absent conditions count as
/// always-true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// The named cell is missing, null, or whitespace-only text.
    ColumnBlank { column: String },
    /// The named cell exists and is not blank.
    ColumnPresent { column: String },
    /// Every nested condition holds.
    AllOf { conditions: Vec<Condition> },
}

impl Condition {
    pub fn holds(&self, row: &Row) -> bool {
        match self {
            Condition::ColumnBlank { column } => row.get(column).is_none_or(Value::is_blank),
            Condition::ColumnPresent { column } => {
                row.get(column).is_some_and(|value| !value.is_blank())
            }
            Condition::AllOf { conditions } => {
                conditions.iter().all(|condition| condition.holds(row))
            }
        }
    }
}

/// Pure value transform applied to `(current value, current row)`.
///
/// Numeric transforms return the original value unchanged when the input
/// does not parse; they never emit NaN or a sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Trim, strip one layer of wrapping quotes, accept a decimal comma,
    /// then parse as a number.
    NormalizeNumber,
    /// Round a numeric (or numeric-text) value to the nearest integer.
    RoundToInteger,
    /// Strip leading and trailing whitespace from text.
    Trim,
    /// Lowercase text.
    Lowercase,
    /// Uppercase text.
    Uppercase,
    /// Replace the value with a constant.
    SetValue { value: Value },
    /// Replace the value with another column's current value.
    FillFrom { column: String },
    /// Regex replacement over text values.
    ReplacePattern { pattern: String, replacement: String },
}

impl Transform {
    pub fn apply(&self, value: &Value, row: &Row) -> Result<Value, CorrectionError> {
        let transformed = match self {
            Transform::NormalizeNumber => normalize_number(value),
            Transform::RoundToInteger => round_to_integer(value),
            Transform::Trim => match value {
                Value::String(s) => Value::String(string_ops::trim(s).into_owned()),
                other => other.clone(),
            },
            Transform::Lowercase => match value {
                Value::String(s) => Value::String(string_ops::lowercase(s).into_owned()),
                other => other.clone(),
            },
            Transform::Uppercase => match value {
                Value::String(s) => Value::String(string_ops::uppercase(s).into_owned()),
                other => other.clone(),
            },
            Transform::SetValue { value: constant } => constant.clone(),
            Transform::FillFrom { column } => {
                row.get(column).cloned().unwrap_or(Value::Empty)
            }
            Transform::ReplacePattern {
                pattern,
                replacement,
            } => {
                let regex =
                    Regex::new(pattern).map_err(|err| CorrectionError::InvalidPattern {
                        pattern: pattern.clone(),
                        source: Box::new(err),
                    })?;
                match value {
                    Value::String(s) => {
                        Value::String(string_ops::regex_replace(s, &regex, replacement).into_owned())
                    }
                    other => other.clone(),
                }
            }
        };
        Ok(transformed)
    }
}

fn normalize_number(value: &Value) -> Value {
    let Value::String(text) = value else {
        return value.clone();
    };
    let trimmed = string_ops::trim(text);
    let unquoted = string_ops::strip_quotes(trimmed.as_ref());
    // Spreadsheet exports from decimal-comma locales write "3,7".
    let candidate = unquoted.replacen(',', ".", 1);
    match candidate.trim().parse::<f64>() {
        Ok(num) if num.is_finite() => Value::from_number(num),
        _ => value.clone(),
    }
}

fn round_to_integer(value: &Value) -> Value {
    match value {
        Value::Integer(_) => value.clone(),
        Value::Float(f) if f.is_finite() => Value::Integer(f.round() as i64),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(num) if num.is_finite() => Value::from_number(num.round()),
            _ => value.clone(),
        },
        other => other.clone(),
    }
}

/// One catalog entry. The description documents intent for humans; only the
/// condition and transform participate in application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub transform: Transform,
}

impl Rule {
    /// Whether this rule should run against the row as it currently stands.
    pub fn applies_to(&self, row: &Row) -> bool {
        self.condition
            .as_ref()
            .is_none_or(|condition| condition.holds(row))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCatalog {
    pub rules: Vec<Rule>,
}

impl RuleCatalog {
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleCatalog { rules }
    }

    /// Lookup by id. A miss is not an error: callers skip the binding.
    pub fn find(&self, id: u32) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Opening rule catalog {path:?}"))?;
        let catalog = serde_yaml::from_str(&raw).context("Parsing rule catalog YAML")?;
        Ok(catalog)
    }

    /// The rule set shipped with the binary. Ids are stable: profiles persist
    /// them across sessions.
    pub fn builtin() -> Self {
        RuleCatalog::new(vec![
            Rule {
                id: 1,
                description: "Coerce numeric text to a number (decimal comma aware)".to_string(),
                condition: None,
                transform: Transform::NormalizeNumber,
            },
            Rule {
                id: 2,
                description: "Round a numeric value to the nearest integer".to_string(),
                condition: None,
                transform: Transform::RoundToInteger,
            },
            Rule {
                id: 3,
                description: "Strip leading and trailing whitespace".to_string(),
                condition: None,
                transform: Transform::Trim,
            },
            Rule {
                id: 4,
                description: "Lowercase text values".to_string(),
                condition: None,
                transform: Transform::Lowercase,
            },
            Rule {
                id: 5,
                description: "Uppercase text values".to_string(),
                condition: None,
                transform: Transform::Uppercase,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, Value)]) -> Row {
        cells
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn normalize_number_accepts_decimal_comma_and_quotes() {
        let empty = Row::new();
        let normalized = Transform::NormalizeNumber
            .apply(&Value::String("\"3,7\"".into()), &empty)
            .unwrap();
        assert_eq!(normalized, Value::Float(3.7));
        let whole = Transform::NormalizeNumber
            .apply(&Value::String(" 12 ".into()), &empty)
            .unwrap();
        assert_eq!(whole, Value::Integer(12));
    }

    #[test]
    fn normalize_number_returns_original_on_parse_failure() {
        let empty = Row::new();
        for raw in ["abc", "1,2,3", "nan", "inf"] {
            let original = Value::String(raw.into());
            let result = Transform::NormalizeNumber.apply(&original, &empty).unwrap();
            assert_eq!(result, original, "input {raw:?} must pass through");
        }
        assert_eq!(
            Transform::NormalizeNumber.apply(&Value::Empty, &empty).unwrap(),
            Value::Empty
        );
    }

    #[test]
    fn round_to_integer_handles_floats_and_numeric_text() {
        let empty = Row::new();
        assert_eq!(
            Transform::RoundToInteger.apply(&Value::Float(3.7), &empty).unwrap(),
            Value::Integer(4)
        );
        assert_eq!(
            Transform::RoundToInteger
                .apply(&Value::String("2.2".into()), &empty)
                .unwrap(),
            Value::Integer(2)
        );
        let garbage = Value::String("n/a".into());
        assert_eq!(
            Transform::RoundToInteger.apply(&garbage, &empty).unwrap(),
            garbage
        );
    }

    #[test]
    fn fill_from_reads_the_current_row() {
        let source = row(&[("a", Value::Integer(9))]);
        assert_eq!(
            Transform::FillFrom { column: "a".into() }
                .apply(&Value::Empty, &source)
                .unwrap(),
            Value::Integer(9)
        );
        assert_eq!(
            Transform::FillFrom { column: "missing".into() }
                .apply(&Value::Integer(1), &source)
                .unwrap(),
            Value::Empty
        );
    }

    #[test]
    fn replace_pattern_rejects_invalid_regex() {
        let result = Transform::ReplacePattern {
            pattern: "(".into(),
            replacement: "".into(),
        }
        .apply(&Value::String("x".into()), &Row::new());
        assert!(matches!(
            result,
            Err(CorrectionError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn blank_and_present_conditions_cover_missing_cells() {
        let sample = row(&[
            ("filled", Value::String("5".into())),
            ("spaces", Value::String("   ".into())),
            ("empty", Value::Empty),
        ]);
        let blank = |column: &str| Condition::ColumnBlank { column: column.into() }.holds(&sample);
        let present =
            |column: &str| Condition::ColumnPresent { column: column.into() }.holds(&sample);

        assert!(!blank("filled"));
        assert!(blank("spaces"));
        assert!(blank("empty"));
        assert!(blank("absent"));
        assert!(present("filled"));
        assert!(!present("absent"));
    }

    #[test]
    fn all_of_requires_every_condition() {
        let sample = row(&[("a", Value::Empty), ("b", Value::Integer(1))]);
        let condition = Condition::AllOf {
            conditions: vec![
                Condition::ColumnBlank { column: "a".into() },
                Condition::ColumnPresent { column: "b".into() },
            ],
        };
        assert!(condition.holds(&sample));
        let failing = Condition::AllOf {
            conditions: vec![
                Condition::ColumnBlank { column: "a".into() },
                Condition::ColumnPresent { column: "absent".into() },
            ],
        };
        assert!(!failing.holds(&sample));
    }

    #[test]
    fn builtin_catalog_ids_are_unique() {
        let catalog = RuleCatalog::builtin();
        for rule in &catalog.rules {
            assert_eq!(
                catalog.find(rule.id).map(|found| found.id),
                Some(rule.id)
            );
        }
        let mut ids: Vec<u32> = catalog.rules.iter().map(|rule| rule.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }
}
