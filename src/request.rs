//! Structured conversion requests and the ordered transformation pipeline.
//!
//! Per-format readers and writers are external collaborators: callers inject
//! them through [`HandlerRegistry`] instead of a process-wide singleton.

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::columns::{ColumnOperation, apply_operations};
use crate::detect::{Format, format_from_extension};
use crate::filter::{FilterCriteria, filter_data};
use crate::keys::{KeyStyle, transform_keys};
use crate::model::DataStructure;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub preserve_formatting: bool,
}

/// Ordered transformation descriptor applied to a [`DataStructure`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "parameters", rename_all = "camelCase")]
pub enum Transformation {
    KeyStyle { style: KeyStyle },
    ColumnOperation { operations: Vec<ColumnOperation> },
    Filter { criteria: FilterCriteria },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionRequest {
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_format: Option<Format>,
    pub target_format: Format,
    #[serde(default)]
    pub options: ConversionOptions,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
}

impl ConversionRequest {
    /// Output path: the explicit target, or the source path with the target
    /// format's canonical extension.
    pub fn resolved_target_path(&self) -> PathBuf {
        match &self.target_path {
            Some(path) => PathBuf::from(path),
            None => {
                PathBuf::from(&self.source_path).with_extension(self.target_format.as_str())
            }
        }
    }
}

/// Applies the descriptors in list order, returning a fresh structure.
pub fn apply_transformations(
    data: &DataStructure,
    transformations: &[Transformation],
) -> crate::error::Result<DataStructure> {
    let mut current = data.clone();
    for transformation in transformations {
        current = match transformation {
            Transformation::KeyStyle { style } => transform_keys(&current, *style),
            Transformation::ColumnOperation { operations } => {
                apply_operations(&current, operations)
            }
            Transformation::Filter { criteria } => filter_data(&current, criteria)?,
        };
        debug!(
            "applied {} step, {} row(s) remain",
            transformation_name(transformation),
            current.rows.len()
        );
    }
    Ok(current)
}

fn transformation_name(transformation: &Transformation) -> &'static str {
    match transformation {
        Transformation::KeyStyle { .. } => "keyStyle",
        Transformation::ColumnOperation { .. } => "columnOperation",
        Transformation::Filter { .. } => "filter",
    }
}

/// Reads and writes one format. Implementations live outside this crate.
pub trait FormatHandler {
    fn format(&self) -> Format;
    fn read(&self, path: &Path, options: &ConversionOptions) -> anyhow::Result<DataStructure>;
    fn write(
        &self,
        data: &DataStructure,
        path: &Path,
        options: &ConversionOptions,
    ) -> anyhow::Result<()>;
}

/// Explicit handler lookup passed to the orchestration layer.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn FormatHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn FormatHandler>) {
        self.handlers.push(handler);
    }

    pub fn lookup(&self, format: Format) -> Option<&dyn FormatHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.format() == format)
            .map(Box::as_ref)
    }

    /// Runs a full conversion: read, transform in order, write. Returns the
    /// transformed structure for inspection.
    pub fn execute(&self, request: &ConversionRequest) -> anyhow::Result<DataStructure> {
        let source_path = Path::new(&request.source_path);
        let source_format = match request.source_format {
            Some(format) => format,
            None => format_from_extension(source_path)
                .with_context(|| format!("resolving source format of {source_path:?}"))?,
        };
        let reader = self
            .lookup(source_format)
            .ok_or_else(|| anyhow!("no handler registered for {source_format}"))?;
        let writer = self
            .lookup(request.target_format)
            .ok_or_else(|| anyhow!("no handler registered for {}", request.target_format))?;

        let data = reader
            .read(source_path, &request.options)
            .with_context(|| format!("reading {source_path:?} as {source_format}"))?;
        for warning in data.validate() {
            debug!("input inconsistency: {warning}");
        }
        let transformed = apply_transformations(&data, &request.transformations)
            .context("applying transformations")?;
        let target_path = request.resolved_target_path();
        writer
            .write(&transformed, &target_path, &request.options)
            .with_context(|| {
                format!("writing {target_path:?} as {}", request.target_format)
            })?;
        info!(
            "converted {} row(s) from {source_format} to {} at {target_path:?}",
            transformed.rows.len(),
            request.target_format
        );
        Ok(transformed)
    }
}
