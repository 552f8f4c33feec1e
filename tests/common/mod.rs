#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tablecast::model::DataStructure;
use tablecast::value::{Record, Value};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Builds a record from field/value pairs, preserving order.
pub fn record(fields: &[(&str, Value)]) -> Record {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect::<IndexMap<_, _>>()
}

/// Five-person sample set used across the integration suites.
pub fn people() -> DataStructure {
    let rows = [
        ("Ada", 30.0, "2024-01-05"),
        ("Bob", 25.0, "2024-02-10"),
        ("Cyd", 35.0, "2024-03-15"),
        ("Dee", 28.0, "2024-04-01"),
        ("Eve", 42.0, "2024-05-20"),
    ]
    .into_iter()
    .map(|(name, age, joined)| {
        record(&[
            ("user_name", Value::from(name)),
            ("age", Value::Number(age)),
            ("joined_at", Value::from(joined)),
        ])
    })
    .collect();
    DataStructure::from_rows(rows)
}
