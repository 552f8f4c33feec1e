//! Ordered add/remove/rename column edits applied to every row and to the
//! header list.

use serde::{Deserialize, Serialize};

use crate::model::DataStructure;
use crate::value::{Record, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnOperation {
    /// Sets `default_value` on rows lacking the column and appends it to the
    /// headers when missing.
    Add {
        column_name: String,
        #[serde(default = "null_value")]
        default_value: Value,
    },
    /// Deletes the column from every row and from the headers.
    Remove { column_name: String },
    /// Moves the value from the old name to the new one, preserving position
    /// in rows and headers.
    Rename { column_name: String, new_name: String },
}

fn null_value() -> Value {
    Value::Null
}

/// Applies the operations in list order and returns a fresh structure.
pub fn apply_operations(data: &DataStructure, operations: &[ColumnOperation]) -> DataStructure {
    let mut rows = data.rows.clone();
    let mut headers = data.headers.clone();
    for operation in operations {
        match operation {
            ColumnOperation::Add {
                column_name,
                default_value,
            } => {
                for row in &mut rows {
                    row.entry(column_name.clone())
                        .or_insert_with(|| default_value.clone());
                }
                if let Some(headers) = &mut headers {
                    if !headers.iter().any(|h| h == column_name) {
                        headers.push(column_name.clone());
                    }
                }
            }
            ColumnOperation::Remove { column_name } => {
                for row in &mut rows {
                    row.shift_remove(column_name);
                }
                if let Some(headers) = &mut headers {
                    headers.retain(|h| h != column_name);
                }
            }
            ColumnOperation::Rename {
                column_name,
                new_name,
            } => {
                for row in &mut rows {
                    *row = rename_field(row, column_name, new_name);
                }
                if let Some(headers) = &mut headers {
                    for header in headers.iter_mut() {
                        if header == column_name {
                            *header = new_name.clone();
                        }
                    }
                }
            }
        }
    }
    let mut result = data.with_rows(Vec::new());
    result.headers = headers;
    result.with_rows(rows)
}

fn rename_field(row: &Record, from: &str, to: &str) -> Record {
    row.iter()
        .map(|(key, value)| {
            if key == from {
                (to.to_string(), value.clone())
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataStructure {
        let mut first = Record::new();
        first.insert("id".to_string(), Value::Number(1.0));
        first.insert("name".to_string(), Value::from("Ada"));
        let mut second = Record::new();
        second.insert("id".to_string(), Value::Number(2.0));
        second.insert("name".to_string(), Value::from("Grace"));
        second.insert("status".to_string(), Value::from("active"));
        DataStructure::new(
            vec![first, second],
            Some(vec!["id".to_string(), "name".to_string()]),
        )
    }

    #[test]
    fn add_fills_missing_values_only() {
        let data = sample();
        let result = apply_operations(
            &data,
            &[ColumnOperation::Add {
                column_name: "status".to_string(),
                default_value: Value::from("unknown"),
            }],
        );
        assert_eq!(result.rows[0]["status"], Value::from("unknown"));
        assert_eq!(result.rows[1]["status"], Value::from("active"));
        assert_eq!(
            result.headers.as_deref().unwrap().last().map(String::as_str),
            Some("status")
        );
    }

    #[test]
    fn remove_deletes_from_rows_and_headers() {
        let data = sample();
        let result = apply_operations(
            &data,
            &[ColumnOperation::Remove {
                column_name: "name".to_string(),
            }],
        );
        assert!(result.rows.iter().all(|row| !row.contains_key("name")));
        assert_eq!(result.headers.as_deref(), Some(&["id".to_string()][..]));
        assert_eq!(result.metadata.total_columns, 1);
    }

    #[test]
    fn rename_preserves_position() {
        let data = sample();
        let result = apply_operations(
            &data,
            &[ColumnOperation::Rename {
                column_name: "id".to_string(),
                new_name: "identifier".to_string(),
            }],
        );
        assert_eq!(
            result.headers.as_deref(),
            Some(&["identifier".to_string(), "name".to_string()][..])
        );
        let keys: Vec<_> = result.rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["identifier".to_string(), "name".to_string()]);
        assert_eq!(result.rows[0]["identifier"], Value::Number(1.0));
    }

    #[test]
    fn operations_apply_in_list_order() {
        let data = sample();
        let result = apply_operations(
            &data,
            &[
                ColumnOperation::Add {
                    column_name: "score".to_string(),
                    default_value: Value::Number(0.0),
                },
                ColumnOperation::Rename {
                    column_name: "score".to_string(),
                    new_name: "points".to_string(),
                },
                ColumnOperation::Remove {
                    column_name: "name".to_string(),
                },
            ],
        );
        assert!(result.rows[0].contains_key("points"));
        assert!(!result.rows[0].contains_key("score"));
        assert!(!result.rows[0].contains_key("name"));
    }
}
