//! Heuristic format detection from file extension and content sampling.
//!
//! Extension lookups are pure; content analysis reads at most the first
//! [`SAMPLE_LIMIT`] bytes of the file and degrades to the extension result
//! when the file cannot be read.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TablecastError};

/// Maximum number of bytes sampled for content analysis.
pub const SAMPLE_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Csv,
    Xlsx,
    Json,
    Xml,
    Md,
}

const EXTENSION_MAP: &[(&str, Format)] = &[
    ("csv", Format::Csv),
    ("xls", Format::Xlsx),
    ("xlsx", Format::Xlsx),
    ("json", Format::Json),
    ("xml", Format::Xml),
    ("md", Format::Md),
    ("markdown", Format::Md),
];

/// Many-to-one keyword table shared by the detector's fallback path and the
/// command parser's format-word resolution.
const FORMAT_ALIASES: &[(&str, Format)] = &[
    ("csv", Format::Csv),
    ("comma", Format::Csv),
    ("excel", Format::Xlsx),
    ("xls", Format::Xlsx),
    ("xlsx", Format::Xlsx),
    ("spreadsheet", Format::Xlsx),
    ("json", Format::Json),
    ("xml", Format::Xml),
    ("markup", Format::Xml),
    ("md", Format::Md),
    ("markdown", Format::Md),
    ("text", Format::Md),
];

impl Format {
    pub fn from_extension(extension: &str) -> Option<Format> {
        let lowered = extension.to_ascii_lowercase();
        EXTENSION_MAP
            .iter()
            .find(|(ext, _)| *ext == lowered)
            .map(|(_, format)| *format)
    }

    /// Resolves informal format words ("excel", "comma", "markup") as well as
    /// canonical names.
    pub fn from_alias(word: &str) -> Option<Format> {
        let lowered = word.to_ascii_lowercase();
        FORMAT_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, format)| *format)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Xlsx => "xlsx",
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Md => "md",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = TablecastError;

    fn from_str(s: &str) -> Result<Self> {
        Format::from_alias(s).ok_or_else(|| TablecastError::UnsupportedFormat(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Extension,
    Content,
    Hybrid,
    ExtensionFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub format: Format,
    pub confidence: f64,
    pub method: DetectionMethod,
    pub details: Vec<String>,
}

/// Detects the format of `path`, optionally sampling content and combining
/// both signals. Repeated calls on an unchanged file return the same result.
pub fn detect_format(path: &Path, analyze_content: bool) -> Result<DetectionReport> {
    let extension_result = detect_from_extension(path);
    if !analyze_content {
        return extension_result;
    }

    let content_result = match read_sample(path) {
        Ok(sample) => detect_from_content(&sample),
        Err(err) => {
            debug!("content sample of {path:?} failed: {err}");
            // Degraded path: unreadable content falls back to the extension
            // signal at reduced confidence.
            return extension_result.map(|mut report| {
                report.confidence = report.confidence.min(0.5);
                report.method = DetectionMethod::ExtensionFallback;
                report
                    .details
                    .push(format!("content could not be read: {err}"));
                report
            });
        }
    };

    match (extension_result, content_result) {
        (Ok(ext), Ok(content)) => Ok(combine(ext, content)),
        (Ok(ext), Err(_)) => {
            let mut report = ext;
            report
                .details
                .push("content analysis was inconclusive".to_string());
            Ok(report)
        }
        (Err(_), Ok(content)) => {
            let mut report = content;
            report
                .details
                .push("extension did not resolve a format".to_string());
            Ok(report)
        }
        (Err(_), Err(err)) => Err(err),
    }
}

/// Pure extension lookup at fixed confidence 0.8.
pub fn detect_from_extension(path: &Path) -> Result<DetectionReport> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let format = Format::from_extension(extension)
        .ok_or_else(|| TablecastError::UnsupportedFormat(path.display().to_string()))?;
    Ok(DetectionReport {
        format,
        confidence: 0.8,
        method: DetectionMethod::Extension,
        details: vec![format!("extension '.{extension}' maps to {format}")],
    })
}

/// Applies the content heuristics in fixed precedence: JSON, XML, Markdown,
/// CSV. The first match wins.
pub fn detect_from_content(sample: &str) -> Result<DetectionReport> {
    let checks: [(fn(&str) -> Option<String>, Format, f64); 4] = [
        (looks_like_json, Format::Json, 0.9),
        (looks_like_xml, Format::Xml, 0.9),
        (looks_like_markdown, Format::Md, 0.7),
        (looks_like_csv, Format::Csv, 0.6),
    ];
    for (check, format, confidence) in checks {
        if let Some(detail) = check(sample) {
            return Ok(DetectionReport {
                format,
                confidence,
                method: DetectionMethod::Content,
                details: vec![detail],
            });
        }
    }
    Err(TablecastError::UnsupportedFormat(
        "content matched no known format".to_string(),
    ))
}

fn combine(extension: DetectionReport, content: DetectionReport) -> DetectionReport {
    let mut details = extension.details.clone();
    details.extend(content.details.iter().cloned());
    if extension.format == content.format {
        let confidence =
            ((extension.confidence + content.confidence) / 2.0 + 0.2).min(0.95);
        return DetectionReport {
            format: extension.format,
            confidence,
            method: DetectionMethod::Hybrid,
            details,
        };
    }
    // Disagreement: the higher-confidence signal wins; ties favor content
    // since it inspects actual bytes.
    if extension.confidence > content.confidence {
        details.push(format!(
            "extension result ({}) overrode content result ({})",
            extension.format, content.format
        ));
        DetectionReport {
            format: extension.format,
            confidence: extension.confidence,
            method: DetectionMethod::Extension,
            details,
        }
    } else {
        details.push(format!(
            "content result ({}) overrode extension result ({})",
            content.format, extension.format
        ));
        DetectionReport {
            format: content.format,
            confidence: content.confidence,
            method: DetectionMethod::Content,
            details,
        }
    }
}

fn read_sample(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; SAMPLE_LIMIT];
    let mut filled = 0usize;
    loop {
        let read = file.read(&mut buffer[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
        if filled == buffer.len() {
            break;
        }
    }
    buffer.truncate(filled);
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn looks_like_json(sample: &str) -> Option<String> {
    let trimmed = sample.trim_start();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return None;
    }
    if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Some("sample parses as JSON".to_string());
    }
    // Truncated samples cannot parse fully; fall back to structural cues.
    static KEY_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#""[^"]*"\s*[:,]"#).expect("json key pattern"));
    if KEY_PATTERN.is_match(trimmed) {
        return Some("sample shows JSON key/value structure".to_string());
    }
    None
}

fn looks_like_xml(sample: &str) -> Option<String> {
    let trimmed = sample.trim_start();
    if !trimmed.starts_with('<') {
        return None;
    }
    if trimmed.starts_with("<?xml") {
        return Some("sample begins with an XML declaration".to_string());
    }
    static ROOT_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^<([A-Za-z_][A-Za-z0-9_.-]*)").expect("xml root pattern"));
    if let Some(caps) = ROOT_PATTERN.captures(trimmed) {
        let root = &caps[1];
        if trimmed.contains(&format!("</{root}")) || trimmed.contains("/>") {
            return Some(format!("sample has XML root element <{root}>"));
        }
    }
    None
}

static MARKDOWN_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("header", r"(?m)^#{1,6}\s+\S"),
        ("unordered list", r"(?m)^\s*[-*+]\s+\S"),
        ("ordered list", r"(?m)^\s*\d+\.\s+\S"),
        ("bold", r"\*\*[^*\n]+\*\*|__[^_\n]+__"),
        ("italic", r"\*[^*\n]+\*|_[^_\n]+_"),
        ("link", r"\[[^\]\n]+\]\([^)\n]+\)"),
        ("table", r"(?m)^\|.+\|\s*$"),
        ("code block", r"(?m)^(?:```|~~~|(?:    |\t)\S)"),
        ("blockquote", r"(?m)^>\s?\S"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("markdown pattern")))
    .collect()
});

fn looks_like_markdown(sample: &str) -> Option<String> {
    let matched: Vec<&str> = MARKDOWN_PATTERNS
        .iter()
        .filter(|(_, regex)| regex.is_match(sample))
        .map(|(name, _)| *name)
        .collect();
    if matched.len() >= 2 {
        Some(format!(
            "sample matches Markdown families: {}",
            matched.join(", ")
        ))
    } else {
        None
    }
}

const CSV_DELIMITERS: &[u8] = &[b',', b';', b'\t', b'|'];

fn looks_like_csv(sample: &str) -> Option<String> {
    let mut lines = sample.lines().filter(|line| !line.trim().is_empty());
    let first = lines.next()?;
    let second = lines.next()?;
    for &delimiter in CSV_DELIMITERS {
        let first_count = field_count(first, delimiter)?;
        let second_count = field_count(second, delimiter)?;
        if first_count > 1 && first_count == second_count {
            return Some(format!(
                "first two lines split into {first_count} fields on '{}'",
                printable_delimiter(delimiter)
            ));
        }
    }
    None
}

fn field_count(line: &str, delimiter: u8) -> Option<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    reader
        .records()
        .next()
        .and_then(|record| record.ok())
        .map(|record| record.len())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

/// Validates a format name or alias, resolving it to a canonical [`Format`].
pub fn validate_format(name: &str) -> Result<Format> {
    name.parse()
}

pub fn supported_extensions() -> Vec<&'static str> {
    EXTENSION_MAP.iter().map(|(ext, _)| *ext).collect()
}

pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Format::from_extension)
        .is_some()
}

/// Extension lookup over a path, failing with `UnsupportedFormat` when the
/// extension is missing or unmapped.
pub fn format_from_extension(path: &Path) -> Result<Format> {
    detect_from_extension(path).map(|report| report.format)
}
