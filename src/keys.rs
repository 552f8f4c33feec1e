//! Identifier-casing conversion and dominant-style detection for record keys.
//!
//! `lowercase` output is deliberately identical to `snake_case` output: both
//! join lowercased tokens with underscores. Callers rely on this equivalence.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TablecastError;
use crate::model::DataStructure;
use crate::value::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyStyle {
    #[serde(rename = "camelCase")]
    Camel,
    #[serde(rename = "snake_case")]
    Snake,
    #[serde(rename = "lowercase")]
    Lower,
    #[serde(rename = "uppercase")]
    Upper,
}

impl KeyStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStyle::Camel => "camelCase",
            KeyStyle::Snake => "snake_case",
            KeyStyle::Lower => "lowercase",
            KeyStyle::Upper => "uppercase",
        }
    }

    /// Pattern a well-formed key of this style must satisfy.
    pub fn pattern(&self) -> &'static Regex {
        static CAMEL: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").expect("camel pattern"));
        static SNAKE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[a-z][a-z0-9]*(?:_[a-z0-9]+)*$").expect("snake pattern")
        });
        static UPPER: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)*$").expect("upper pattern")
        });
        match self {
            KeyStyle::Camel => &CAMEL,
            KeyStyle::Snake | KeyStyle::Lower => &SNAKE,
            KeyStyle::Upper => &UPPER,
        }
    }
}

impl fmt::Display for KeyStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyStyle {
    type Err = TablecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "camelcase" | "camel_case" | "camel" => Ok(KeyStyle::Camel),
            "snake_case" | "snakecase" | "snake" => Ok(KeyStyle::Snake),
            "lowercase" | "lower" => Ok(KeyStyle::Lower),
            "uppercase" | "upper" => Ok(KeyStyle::Upper),
            _ => Err(TablecastError::InvalidCommand {
                message: format!("unknown key style '{s}'"),
                suggestions: vec![
                    "supported styles: camelCase, snake_case, lowercase, uppercase".to_string(),
                ],
            }),
        }
    }
}

/// Converts a single key to the requested style. Tokenization splits on
/// underscores, hyphens, whitespace, and lower-to-upper case boundaries.
pub fn transform_key(key: &str, style: KeyStyle) -> String {
    if key.is_empty() {
        return String::new();
    }
    match style {
        KeyStyle::Camel => key.to_lower_camel_case(),
        KeyStyle::Snake | KeyStyle::Lower => key.to_snake_case(),
        KeyStyle::Upper => key.to_shouty_snake_case(),
    }
}

/// Rewrites every record's field names and the header list, recursing into
/// nested records and lists of records. Row order and values are preserved.
pub fn transform_keys(data: &DataStructure, style: KeyStyle) -> DataStructure {
    let rows = data
        .rows
        .iter()
        .map(|row| transform_record(row, style))
        .collect();
    let mut result = data.with_rows(rows);
    result.headers = data.headers.as_ref().map(|headers| {
        headers
            .iter()
            .map(|header| transform_key(header, style))
            .collect()
    });
    result
}

fn transform_record(record: &Record, style: KeyStyle) -> Record {
    record
        .iter()
        .map(|(key, value)| (transform_key(key, style), transform_value(value, style)))
        .collect()
}

fn transform_value(value: &Value, style: KeyStyle) -> Value {
    match value {
        Value::Record(nested) => Value::Record(
            nested
                .iter()
                .map(|(key, inner)| (transform_key(key, style), transform_value(inner, style)))
                .collect(),
        ),
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|item| transform_value(item, style))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedStyle {
    Camel,
    Snake,
    /// Bare lowercase tokens also satisfy the snake and camel patterns, which
    /// win the tie, so detection only reports `Lower` when mixed shapes leave
    /// it the sole leader. All-lowercase single-token sets come back as
    /// `Snake`.
    Lower,
    Upper,
    Mixed,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleDetection {
    pub style: DetectedStyle,
    pub confidence: f64,
}

/// Tallies, per style, how many keys satisfy that style's pattern. A key may
/// satisfy several styles at once (`age` is valid camelCase, snake_case, and
/// lowercase), so a unanimous set still reports the dominant shared style at
/// confidence 1. A key set no single style covers is `Mixed` at confidence
/// below 0.5, scaled by how dominant the leading style is.
pub fn detect_key_style<S: AsRef<str>>(keys: &[S]) -> StyleDetection {
    if keys.is_empty() {
        return StyleDetection {
            style: DetectedStyle::Unknown,
            confidence: 0.0,
        };
    }
    static LOWER_ONLY: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*$").expect("lower pattern"));
    let tally = |pattern: &Regex| {
        keys.iter()
            .filter(|key| pattern.is_match(key.as_ref()))
            .count()
    };
    // Ties resolve to the first entry, preferring the more constrained styles.
    let counts = [
        (DetectedStyle::Upper, tally(KeyStyle::Upper.pattern())),
        (DetectedStyle::Snake, tally(KeyStyle::Snake.pattern())),
        (DetectedStyle::Camel, tally(KeyStyle::Camel.pattern())),
        (DetectedStyle::Lower, tally(&LOWER_ONLY)),
    ];
    let total = keys.len();
    let mut leader = (DetectedStyle::Unknown, 0usize);
    for (style, count) in counts {
        if count > leader.1 {
            leader = (style, count);
        }
    }
    if leader.1 == total {
        StyleDetection {
            style: leader.0,
            confidence: 1.0,
        }
    } else {
        StyleDetection {
            style: DetectedStyle::Mixed,
            confidence: (leader.1 as f64 / total as f64) * 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyIssueKind {
    Duplicate,
    Empty,
    Invalid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyIssue {
    pub kind: KeyIssueKind,
    pub key: String,
    pub message: String,
}

/// Reports collisions, empty keys, and transformed keys that fail the target
/// style's own pattern.
pub fn validate_transformation<S: AsRef<str>>(
    original: &[S],
    transformed: &[S],
    style: KeyStyle,
) -> Vec<KeyIssue> {
    let mut issues = Vec::new();
    let mut seen: IndexMap<&str, usize> = IndexMap::new();
    for key in transformed {
        *seen.entry(key.as_ref()).or_insert(0) += 1;
    }
    for (key, count) in &seen {
        if *count > 1 {
            issues.push(KeyIssue {
                kind: KeyIssueKind::Duplicate,
                key: key.to_string(),
                message: format!("{count} original keys map to '{key}'"),
            });
        }
    }
    for (original_key, transformed_key) in original.iter().zip(transformed.iter()) {
        let transformed_key = transformed_key.as_ref();
        if transformed_key.is_empty() {
            issues.push(KeyIssue {
                kind: KeyIssueKind::Empty,
                key: original_key.as_ref().to_string(),
                message: format!(
                    "key '{}' transformed to an empty string",
                    original_key.as_ref()
                ),
            });
        } else if !style.pattern().is_match(transformed_key) {
            issues.push(KeyIssue {
                kind: KeyIssueKind::Invalid,
                key: transformed_key.to_string(),
                message: format!("'{transformed_key}' does not satisfy {style}"),
            });
        }
    }
    issues
}

/// Builds an explicit original-to-transformed key lookup.
pub fn create_key_mapping<S: AsRef<str>>(keys: &[S], style: KeyStyle) -> IndexMap<String, String> {
    keys.iter()
        .map(|key| {
            (
                key.as_ref().to_string(),
                transform_key(key.as_ref(), style),
            )
        })
        .collect()
}

/// Applies an explicit key mapping to every row and the header list. Keys
/// absent from the mapping pass through unchanged.
pub fn apply_key_mapping(data: &DataStructure, mapping: &IndexMap<String, String>) -> DataStructure {
    let rows = data
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(key, value)| {
                    let mapped = mapping.get(key).cloned().unwrap_or_else(|| key.clone());
                    (mapped, value.clone())
                })
                .collect()
        })
        .collect();
    let mut result = data.with_rows(rows);
    result.headers = data.headers.as_ref().map(|headers| {
        headers
            .iter()
            .map(|header| mapping.get(header).cloned().unwrap_or_else(|| header.clone()))
            .collect()
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn transform_key_covers_all_styles() {
        assert_eq!(transform_key("user_name", KeyStyle::Camel), "userName");
        assert_eq!(transform_key("userName", KeyStyle::Snake), "user_name");
        assert_eq!(transform_key("userName", KeyStyle::Lower), "user_name");
        assert_eq!(transform_key("first-name", KeyStyle::Upper), "FIRST_NAME");
        assert_eq!(transform_key("", KeyStyle::Camel), "");
    }

    #[test]
    fn lowercase_and_snake_case_outputs_are_identical() {
        for key in ["userName", "user_name", "User Name", "USER-NAME"] {
            assert_eq!(
                transform_key(key, KeyStyle::Lower),
                transform_key(key, KeyStyle::Snake)
            );
        }
    }

    #[test]
    fn transform_keys_recurses_into_nested_records() {
        let mut nested = Record::new();
        nested.insert("zip_code".to_string(), Value::from("90210"));
        let mut row = Record::new();
        row.insert("user_name".to_string(), Value::from("Ada"));
        row.insert("home_address".to_string(), Value::Record(nested));
        row.insert(
            "past_orders".to_string(),
            Value::List(vec![Value::Record({
                let mut order = Record::new();
                order.insert("order_id".to_string(), Value::Number(7.0));
                order
            })]),
        );
        let data = DataStructure::from_rows(vec![row]);

        let transformed = transform_keys(&data, KeyStyle::Camel);
        let row = &transformed.rows[0];
        assert!(row.contains_key("userName"));
        let Value::Record(address) = &row["homeAddress"] else {
            panic!("expected nested record");
        };
        assert!(address.contains_key("zipCode"));
        let Value::List(orders) = &row["pastOrders"] else {
            panic!("expected list");
        };
        let Value::Record(order) = &orders[0] else {
            panic!("expected record in list");
        };
        assert!(order.contains_key("orderId"));
        assert_eq!(
            transformed.headers.as_deref(),
            Some(
                &[
                    "userName".to_string(),
                    "homeAddress".to_string(),
                    "pastOrders".to_string()
                ][..]
            )
        );
    }

    #[test]
    fn detect_key_style_reports_unanimous_styles_at_full_confidence() {
        let detection = detect_key_style(&["userName", "firstName"]);
        assert_eq!(detection.style, DetectedStyle::Camel);
        assert!((detection.confidence - 1.0).abs() < f64::EPSILON);

        let detection = detect_key_style(&["user_name", "first_name"]);
        assert_eq!(detection.style, DetectedStyle::Snake);
        assert!((detection.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detect_key_style_flags_mixed_sets_below_half_confidence() {
        let detection = detect_key_style(&["userName", "first_name", "LAST_NAME"]);
        assert_eq!(detection.style, DetectedStyle::Mixed);
        assert!(detection.confidence < 0.5);
    }

    #[test]
    fn detect_key_style_resolves_bare_lowercase_tokens_to_snake() {
        let detection = detect_key_style(&["name", "age", "city"]);
        assert_eq!(detection.style, DetectedStyle::Snake);
        assert!((detection.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detect_key_style_on_empty_input_is_unknown() {
        let detection = detect_key_style::<&str>(&[]);
        assert_eq!(detection.style, DetectedStyle::Unknown);
        assert_eq!(detection.confidence, 0.0);
    }

    #[test]
    fn validate_transformation_reports_collisions_and_invalid_keys() {
        let original = ["user name", "user_name", ""];
        let transformed = ["user_name", "user_name", ""];
        let issues = validate_transformation(&original, &transformed, KeyStyle::Snake);
        assert!(issues
            .iter()
            .any(|issue| issue.kind == KeyIssueKind::Duplicate));
        assert!(issues.iter().any(|issue| issue.kind == KeyIssueKind::Empty));

        let issues = validate_transformation(&["ok"], &["Not Valid"], KeyStyle::Snake);
        assert!(issues
            .iter()
            .any(|issue| issue.kind == KeyIssueKind::Invalid));
    }

    #[test]
    fn key_mapping_round_trip_passes_unmapped_keys_through() {
        let mapping = create_key_mapping(&["user_name"], KeyStyle::Camel);
        assert_eq!(mapping["user_name"], "userName");

        let mut row = Record::new();
        row.insert("user_name".to_string(), Value::from("Ada"));
        row.insert("age".to_string(), Value::Number(36.0));
        let data = DataStructure::from_rows(vec![row]);
        let mapped = apply_key_mapping(&data, &mapping);
        assert!(mapped.rows[0].contains_key("userName"));
        assert!(mapped.rows[0].contains_key("age"));
    }
}
