//! In-memory tabular model exchanged between read, transform, and write
//! stages. Constructed once per conversion by a reader, passed by value
//! through the pipeline, discarded after write.

use serde::{Deserialize, Serialize};

use crate::value::Record;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DataMetadata {
    pub original_format: Option<String>,
    pub encoding: Option<String>,
    pub sheet_name: Option<String>,
    pub total_rows: usize,
    pub total_columns: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DataStructure {
    pub rows: Vec<Record>,
    pub headers: Option<Vec<String>>,
    pub metadata: DataMetadata,
}

impl DataStructure {
    pub fn new(rows: Vec<Record>, headers: Option<Vec<String>>) -> Self {
        let metadata = DataMetadata {
            total_rows: rows.len(),
            total_columns: column_count(&rows, headers.as_deref()),
            ..DataMetadata::default()
        };
        DataStructure {
            rows,
            headers,
            metadata,
        }
    }

    /// Builds a structure from rows alone, deriving headers from the first
    /// row's field order. Test and handler convenience.
    pub fn from_rows(rows: Vec<Record>) -> Self {
        let headers = rows
            .first()
            .map(|row| row.keys().cloned().collect::<Vec<_>>());
        Self::new(rows, headers)
    }

    /// Fresh structure carrying this one's provenance metadata but a new row
    /// set, with row/column counts recomputed.
    pub fn with_rows(&self, rows: Vec<Record>) -> Self {
        let mut metadata = self.metadata.clone();
        metadata.total_rows = rows.len();
        metadata.total_columns = column_count(&rows, self.headers.as_deref());
        DataStructure {
            rows,
            headers: self.headers.clone(),
            metadata,
        }
    }

    pub fn column_count(&self) -> usize {
        column_count(&self.rows, self.headers.as_deref())
    }

    /// True when the column is named in `headers` or present in any row.
    pub fn has_column(&self, name: &str) -> bool {
        if let Some(headers) = &self.headers {
            if headers.iter().any(|h| h == name) {
                return true;
            }
        }
        self.rows.iter().any(|row| row.contains_key(name))
    }

    /// Non-fatal consistency checks: duplicate headers and stale metadata
    /// counts produce warnings, never errors.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(headers) = &self.headers {
            let mut seen = std::collections::HashSet::new();
            for header in headers {
                if !seen.insert(header.as_str()) {
                    warnings.push(format!("duplicate header '{header}'"));
                }
            }
        }
        if self.metadata.total_rows != self.rows.len() {
            warnings.push(format!(
                "metadata reports {} row(s) but structure holds {}",
                self.metadata.total_rows,
                self.rows.len()
            ));
        }
        let expected_columns = self.column_count();
        if self.metadata.total_columns != expected_columns {
            warnings.push(format!(
                "metadata reports {} column(s) but structure holds {}",
                self.metadata.total_columns, expected_columns
            ));
        }
        warnings
    }
}

fn column_count(rows: &[Record], headers: Option<&[String]>) -> usize {
    match headers {
        Some(headers) => headers.len(),
        None => rows.iter().map(|row| row.len()).max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use indexmap::IndexMap;

    fn row(fields: &[(&str, Value)]) -> Record {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<IndexMap<_, _>>()
    }

    #[test]
    fn from_rows_derives_headers_and_counts() {
        let data = DataStructure::from_rows(vec![
            row(&[("id", Value::Number(1.0)), ("name", Value::from("Ada"))]),
            row(&[("id", Value::Number(2.0)), ("name", Value::from("Grace"))]),
        ]);
        assert_eq!(
            data.headers.as_deref(),
            Some(&["id".to_string(), "name".to_string()][..])
        );
        assert_eq!(data.metadata.total_rows, 2);
        assert_eq!(data.metadata.total_columns, 2);
        assert!(data.validate().is_empty());
    }

    #[test]
    fn validate_reports_duplicate_headers_and_stale_counts() {
        let mut data = DataStructure::from_rows(vec![row(&[("id", Value::Number(1.0))])]);
        data.headers = Some(vec!["id".to_string(), "id".to_string()]);
        data.metadata.total_rows = 9;
        let warnings = data.validate();
        assert!(warnings.iter().any(|w| w.contains("duplicate header 'id'")));
        assert!(warnings.iter().any(|w| w.contains("9 row(s)")));
    }

    #[test]
    fn headerless_column_count_uses_widest_row() {
        let mut data = DataStructure::new(
            vec![
                row(&[("a", Value::Null)]),
                row(&[("a", Value::Null), ("b", Value::Null), ("c", Value::Null)]),
            ],
            None,
        );
        data.headers = None;
        assert_eq!(data.column_count(), 3);
    }
}
