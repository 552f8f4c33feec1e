//! Row selection: criteria evaluation, deduplication, sampling, and filter
//! statistics. Every entry point returns a fresh [`DataStructure`]; inputs are
//! never mutated.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TablecastError};
use crate::model::DataStructure;
use crate::value::{Record, Value, parse_flexible_date};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnFilter {
    pub column_name: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateRange {
    pub date_column: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_filters: Option<Vec<ColumnFilter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_conditions: Option<Vec<String>>,
}

/// Convenience constructor; performs no validation.
pub fn column_filter(column_name: &str, operator: &str, value: Value) -> ColumnFilter {
    ColumnFilter {
        column_name: column_name.to_string(),
        operator: operator.to_string(),
        value,
    }
}

/// Convenience constructor; performs no validation.
pub fn date_range_filter(date_column: &str, start_date: &str, end_date: &str) -> DateRange {
    DateRange {
        date_column: date_column.to_string(),
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
    }
}

/// Convenience constructor; performs no validation.
pub fn filter_criteria(
    column_filters: Option<Vec<ColumnFilter>>,
    date_range: Option<DateRange>,
    custom_conditions: Option<Vec<String>>,
) -> FilterCriteria {
    FilterCriteria {
        column_filters,
        date_range,
        custom_conditions,
    }
}

/// Applies the criteria in fixed order: column filters (AND-combined), then
/// the date range, then custom conditions (AND-combined).
pub fn filter_data(data: &DataStructure, criteria: &FilterCriteria) -> Result<DataStructure> {
    // Operator and date validity are checked up front so a bad criterion
    // fails before any row is inspected.
    if let Some(filters) = &criteria.column_filters {
        for filter in filters {
            if operator_from_str(&filter.operator)? == Operator::Between {
                between_bounds(filter)?;
            }
        }
    }
    let date_bounds = match &criteria.date_range {
        Some(range) => Some((
            range.date_column.clone(),
            parse_flexible_date(&range.start_date)?,
            parse_flexible_date(&range.end_date)?,
        )),
        None => None,
    };
    let conditions: Vec<CustomCondition> = criteria
        .custom_conditions
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|raw| {
            let parsed = CustomCondition::parse(raw);
            if parsed.is_none() {
                debug!("skipping unparseable condition '{raw}'");
            }
            parsed
        })
        .collect();

    let mut rows = Vec::new();
    'rows: for row in &data.rows {
        if let Some(filters) = &criteria.column_filters {
            for filter in filters {
                if !matches_column_filter(row, filter)? {
                    continue 'rows;
                }
            }
        }
        if let Some((column, start, end)) = &date_bounds {
            let cell = row.get(column.as_str()).unwrap_or(&Value::Null);
            // Rows whose date cell does not parse are silently excluded.
            match cell.as_date() {
                Some(date) if date >= *start && date <= *end => {}
                _ => continue 'rows,
            }
        }
        for condition in &conditions {
            if !condition.matches(row) {
                continue 'rows;
            }
        }
        rows.push(row.clone());
    }
    Ok(data.with_rows(rows))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    Between,
}

fn operator_from_str(operator: &str) -> Result<Operator> {
    match operator {
        "equals" => Ok(Operator::Equals),
        "contains" => Ok(Operator::Contains),
        "greaterThan" | "greater_than" => Ok(Operator::GreaterThan),
        "lessThan" | "less_than" => Ok(Operator::LessThan),
        "between" => Ok(Operator::Between),
        other => Err(TablecastError::UnknownOperator(other.to_string())),
    }
}

fn between_bounds(filter: &ColumnFilter) -> Result<(&Value, &Value)> {
    match &filter.value {
        Value::List(bounds) if bounds.len() == 2 => Ok((&bounds[0], &bounds[1])),
        _ => Err(TablecastError::BetweenValueNotArray {
            column: filter.column_name.clone(),
        }),
    }
}

fn matches_column_filter(row: &Record, filter: &ColumnFilter) -> Result<bool> {
    let cell = row.get(filter.column_name.as_str()).unwrap_or(&Value::Null);
    match operator_from_str(&filter.operator)? {
        Operator::Equals => Ok(cell.loose_eq(&filter.value)),
        Operator::Contains => Ok(cell
            .as_display()
            .to_lowercase()
            .contains(&filter.value.as_display().to_lowercase())),
        Operator::GreaterThan => Ok(matches!(
            cell.loose_cmp(&filter.value),
            Some(std::cmp::Ordering::Greater)
        )),
        Operator::LessThan => Ok(matches!(
            cell.loose_cmp(&filter.value),
            Some(std::cmp::Ordering::Less)
        )),
        Operator::Between => {
            let (low, high) = between_bounds(filter)?;
            let above = matches!(
                cell.loose_cmp(low),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            );
            let below = matches!(
                cell.loose_cmp(high),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            );
            Ok(above && below)
        }
    }
}

#[derive(Debug, Clone)]
struct CustomCondition {
    field: String,
    operator: String,
    literal: Value,
}

static CONDITION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(\S+)\s*(===|!==|==|!=|>=|<=|>|<)\s*(.+?)\s*$"#).expect("condition pattern")
});

impl CustomCondition {
    /// Parses `<field> <op> <literal>`; anything else yields `None` and the
    /// condition is skipped rather than failing the whole filter.
    fn parse(raw: &str) -> Option<CustomCondition> {
        let caps = CONDITION_PATTERN.captures(raw)?;
        let literal = parse_literal(&caps[3])?;
        Some(CustomCondition {
            field: caps[1].to_string(),
            operator: caps[2].to_string(),
            literal,
        })
    }

    fn matches(&self, row: &Record) -> bool {
        let cell = row.get(self.field.as_str()).unwrap_or(&Value::Null);
        match self.operator.as_str() {
            "==" | "===" => cell.loose_eq(&self.literal),
            "!=" | "!==" => !cell.loose_eq(&self.literal),
            ">" => matches!(
                cell.loose_cmp(&self.literal),
                Some(std::cmp::Ordering::Greater)
            ),
            ">=" => matches!(
                cell.loose_cmp(&self.literal),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            ),
            "<" => matches!(cell.loose_cmp(&self.literal), Some(std::cmp::Ordering::Less)),
            "<=" => matches!(
                cell.loose_cmp(&self.literal),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            ),
            _ => false,
        }
    }
}

fn parse_literal(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("null") {
        return Some(Value::Null);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Some(Value::Bool(true));
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Some(Value::Bool(false));
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        return Some(Value::Number(number));
    }
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        if (bytes[0] == b'"' && bytes[trimmed.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[trimmed.len() - 1] == b'\'')
        {
            return Some(Value::Text(trimmed[1..trimmed.len() - 1].to_string()));
        }
    }
    None
}

/// First-occurrence-wins distinct filter on one column. The column must be
/// present in `headers`.
pub fn filter_unique(data: &DataStructure, column: &str) -> Result<DataStructure> {
    let known = data
        .headers
        .as_ref()
        .is_some_and(|headers| headers.iter().any(|h| h == column));
    if !known {
        return Err(TablecastError::ColumnNotFound(column.to_string()));
    }
    let mut seen = HashSet::new();
    let rows = data
        .rows
        .iter()
        .filter(|row| {
            let key = row
                .get(column)
                .map(Value::as_display)
                .unwrap_or_default();
            seen.insert(key)
        })
        .cloned()
        .collect();
    Ok(data.with_rows(rows))
}

/// Removes rows structurally equal to an earlier row, keeping first
/// occurrences in order.
pub fn filter_duplicates(data: &DataStructure) -> DataStructure {
    let mut seen = HashSet::new();
    let rows = data
        .rows
        .iter()
        .filter(|row| {
            let fingerprint = serde_json::to_string(row).unwrap_or_default();
            seen.insert(fingerprint)
        })
        .cloned()
        .collect();
    data.with_rows(rows)
}

/// With `remove_nulls`, drops a row when ANY listed column is null; without
/// it, keeps only rows where AT LEAST ONE listed column is null. Every listed
/// column must exist in the data.
pub fn filter_null_values(
    data: &DataStructure,
    columns: &[String],
    remove_nulls: bool,
) -> Result<DataStructure> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|column| !data.has_column(column))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(TablecastError::ColumnsNotFound(missing));
    }
    let any_null = |row: &Record| {
        columns
            .iter()
            .any(|column| row.get(column.as_str()).is_none_or(Value::is_null))
    };
    let rows = data
        .rows
        .iter()
        .filter(|row| {
            if remove_nulls {
                !any_null(row)
            } else {
                any_null(row)
            }
        })
        .cloned()
        .collect();
    Ok(data.with_rows(rows))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    EveryNth,
    First,
    Last,
    Random,
}

impl FromStr for SampleKind {
    type Err = TablecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "every_nth" => Ok(SampleKind::EveryNth),
            "first" => Ok(SampleKind::First),
            "last" => Ok(SampleKind::Last),
            "random" => Ok(SampleKind::Random),
            other => Err(TablecastError::UnknownSampleType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleSpec {
    #[serde(rename = "type")]
    pub kind: SampleKind,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Row sampling. `every_nth` keeps indices 0, n, 2n, …; `first`/`last` take a
/// capped head/tail slice; `random` draws `count` rows from a self-contained
/// generator so an explicit seed reproduces the same row sequence across runs
/// and processes.
pub fn filter_sample(data: &DataStructure, spec: &SampleSpec) -> Result<DataStructure> {
    let rows = match spec.kind {
        SampleKind::EveryNth => {
            if spec.count == 0 {
                return Err(TablecastError::InvalidSampleInterval);
            }
            data.rows
                .iter()
                .step_by(spec.count)
                .cloned()
                .collect::<Vec<_>>()
        }
        SampleKind::First => data.rows.iter().take(spec.count).cloned().collect(),
        SampleKind::Last => {
            let skip = data.rows.len().saturating_sub(spec.count);
            data.rows.iter().skip(skip).cloned().collect()
        }
        SampleKind::Random => {
            let mut rng = match spec.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let amount = spec.count.min(data.rows.len());
            index::sample(&mut rng, data.rows.len(), amount)
                .iter()
                .map(|idx| data.rows[idx].clone())
                .collect()
        }
    };
    Ok(data.with_rows(rows))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FilterStatistics {
    pub original_rows: usize,
    pub filtered_rows: usize,
    pub removed_rows: usize,
    pub removal_percentage: f64,
}

pub fn filter_statistics(original: &DataStructure, filtered: &DataStructure) -> FilterStatistics {
    let original_rows = original.rows.len();
    let filtered_rows = filtered.rows.len();
    let removed_rows = original_rows.saturating_sub(filtered_rows);
    let removal_percentage = if original_rows == 0 {
        0.0
    } else {
        let raw = removed_rows as f64 / original_rows as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    };
    FilterStatistics {
        original_rows,
        filtered_rows,
        removed_rows,
        removal_percentage,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriteriaReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Non-throwing pre-flight check over filter criteria against a data set.
pub fn validate_filter_criteria(data: &DataStructure, criteria: &FilterCriteria) -> CriteriaReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Some(filters) = &criteria.column_filters {
        for filter in filters {
            if filter.column_name.trim().is_empty() {
                errors.push("column filter with empty column name".to_string());
                continue;
            }
            if let Some(headers) = &data.headers {
                if !headers.iter().any(|h| h == &filter.column_name) {
                    errors.push(format!(
                        "filter column '{}' not present in headers",
                        filter.column_name
                    ));
                }
            }
            if filter.operator.trim().is_empty() {
                errors.push(format!(
                    "filter on column '{}' is missing an operator",
                    filter.column_name
                ));
            } else if filter.operator == "between"
                && !matches!(&filter.value, Value::List(bounds) if bounds.len() == 2)
            {
                errors.push(format!(
                    "'between' filter on column '{}' requires a two-element array value",
                    filter.column_name
                ));
            }
            if filter.value.is_null() && filter.operator != "between" {
                warnings.push(format!(
                    "filter on column '{}' has no value",
                    filter.column_name
                ));
            }
        }
    }

    if let Some(range) = &criteria.date_range {
        if !data.has_column(&range.date_column) {
            errors.push(format!(
                "date range column '{}' not present in data",
                range.date_column
            ));
        }
        let start = parse_flexible_date(&range.start_date);
        let end = parse_flexible_date(&range.end_date);
        if start.is_err() {
            errors.push(format!("unparseable start date '{}'", range.start_date));
        }
        if end.is_err() {
            errors.push(format!("unparseable end date '{}'", range.end_date));
        }
        if let (Ok(start), Ok(end)) = (start, end) {
            if start > end {
                warnings.push(format!(
                    "start date '{}' is after end date '{}'",
                    range.start_date, range.end_date
                ));
            }
        }
    }

    if let Some(conditions) = &criteria.custom_conditions {
        for condition in conditions {
            if !CONDITION_PATTERN.is_match(condition) {
                warnings.push(format!(
                    "condition '{condition}' contains no recognized comparison operator"
                ));
            }
        }
    }

    CriteriaReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}
