use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TablecastError};

/// An ordered record: field name to dynamically typed value.
pub type Record = IndexMap<String, Value>;

/// Tagged cell value with explicit comparison semantics per variant.
///
/// Untagged serde keeps the JSON shape natural: `null`, booleans, numbers,
/// strings, arrays, and objects map straight onto the variants. Date strings
/// only deserialize as `Date` when they match the canonical chrono layout;
/// anything else lands in `Text` and is coerced lazily by `as_date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
    List(Vec<Value>),
    Record(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human-readable rendering used for display, `contains` matching, and
    /// string-keyed deduplication.
    pub fn as_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    (*n as i64).to_string()
                } else {
                    n.to_string()
                }
            }
            Value::Date(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            Value::Text(s) => s.clone(),
            Value::List(_) | Value::Record(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }

    /// Numeric view: numbers directly, booleans and numeric strings coerced.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Temporal view: dates directly, text coerced through the lenient
    /// multi-format parsers.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(dt) => Some(*dt),
            Value::Text(s) => parse_flexible_date(s).ok(),
            _ => None,
        }
    }

    /// Equality with explicit cross-variant coercion: numeric when both sides
    /// coerce to numbers, temporal when both coerce to dates, structural for
    /// lists and records, display-string equality otherwise.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => {
                if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
                    a == b
                } else if let (Some(a), Some(b)) = (self.as_date(), other.as_date()) {
                    a == b
                } else {
                    self.as_display() == other.as_display()
                }
            }
        }
    }

    /// Ordering with the same coercion ladder as `loose_eq`. Nulls, lists,
    /// and records do not participate in ordering.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::List(_), _) | (_, Value::List(_)) => None,
            (Value::Record(_), _) | (_, Value::Record(_)) => None,
            _ => {
                if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
                    Some(a.total_cmp(&b))
                } else if let (Some(a), Some(b)) = (self.as_date(), other.as_date()) {
                    Some(a.cmp(&b))
                } else {
                    Some(self.as_display().cmp(&other.as_display()))
                }
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a date or datetime from any of the supported layouts; bare dates
/// resolve to midnight.
pub fn parse_flexible_date(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed.and_time(chrono::NaiveTime::MIN));
        }
    }
    Err(TablecastError::InvalidDate(value.to_string()))
}
