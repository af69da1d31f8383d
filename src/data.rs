use std::fmt;

use serde::{Deserialize, Serialize};

/// Dynamic cell value. `Empty` stands in for both a missing cell and an
/// explicit null; an empty string is kept distinct so trimming rules can
/// still observe it.
///
/// Serialization is untagged: catalog files and JSON diff output carry
/// native scalars rather than enum wrappers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Empty,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Builds a value from a raw CSV field. Fields arrive as text; typing is
    /// the job of correction rules, not the reader.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Value::Empty
        } else {
            Value::String(field.to_string())
        }
    }

    /// True for a missing cell, an explicit empty, or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value, without parsing text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Wraps a parsed number, collapsing integral floats into `Integer` so
    /// whole numbers render without a trailing fraction.
    pub fn from_number(num: f64) -> Self {
        if num.fract() == 0.0 && num >= i64::MIN as f64 && num <= i64::MAX as f64 {
            Value::Integer(num as i64)
        } else {
            Value::Float(num)
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// One record: an insertion-ordered mapping from column key to value.
///
/// Key enumeration order is the order cells were inserted, which for rows
/// read from a CSV is header order. Lookup is a linear scan; rows are as
/// wide as a spreadsheet, not a database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Updates the cell in place, or appends it when the key is new.
    pub fn set(&mut self, key: &str, value: Value) {
        match self.cells.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((key.to_string(), value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (key, value) in iter {
            row.set(&key, value);
        }
        row
    }
}
