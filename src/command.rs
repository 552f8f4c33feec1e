//! Pattern-driven parsing of free-text instructions into structured,
//! confidence-scored conversion requests.
//!
//! An ordered table of `(pattern, action, base confidence, extractor)`
//! entries is evaluated against the normalized input; every match becomes a
//! candidate, a shared secondary pass extracts cross-cutting options, and the
//! highest-confidence candidate wins with ties broken by table order.
//! Ambiguity is never an error: low-confidence results carry `ambiguities`
//! and `suggestions` for the caller to act on.

use std::sync::LazyLock;

use encoding_rs::Encoding;
use itertools::Itertools;
use log::debug;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::detect::Format;
use crate::error::{Result, TablecastError};
use crate::keys::KeyStyle;
use crate::request::{ConversionOptions, ConversionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
    Convert,
    Help,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommandOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_style: Option<KeyStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub preserve_formatting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedCommand {
    pub action: CommandAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_format: Option<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_format: Option<Format>,
    #[serde(default)]
    pub options: CommandOptions,
    pub confidence: f64,
    #[serde(default)]
    pub ambiguities: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ParsedCommand {
    fn new(action: CommandAction, confidence: f64) -> Self {
        ParsedCommand {
            action,
            source_path: None,
            target_path: None,
            source_format: None,
            target_format: None,
            options: CommandOptions::default(),
            confidence,
            ambiguities: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

type Extractor = fn(&Captures, &mut ParsedCommand);

struct PatternEntry {
    name: &'static str,
    regex: Regex,
    action: CommandAction,
    base_confidence: f64,
    extract: Extractor,
}

fn entry(
    name: &'static str,
    pattern: &str,
    action: CommandAction,
    base_confidence: f64,
    extract: Extractor,
) -> PatternEntry {
    PatternEntry {
        name,
        regex: Regex::new(pattern).expect("command pattern"),
        action,
        base_confidence,
        extract,
    }
}

static PATTERN_TABLE: LazyLock<Vec<PatternEntry>> = LazyLock::new(|| {
    vec![
        entry(
            "convert-from-to",
            r"^convert\s+(\S+)\s+from\s+([a-z0-9]+)\s+(?:to|into)\s+([a-z0-9]+)(?:\s+as\s+(\S+))?",
            CommandAction::Convert,
            0.9,
            |caps, cmd| {
                cmd.source_path = Some(caps[1].to_string());
                cmd.source_format = Format::from_alias(&caps[2]);
                cmd.target_format = Format::from_alias(&caps[3]);
                cmd.target_path = caps.get(4).map(|m| m.as_str().to_string());
            },
        ),
        entry(
            "transform-from-to",
            r"^(?:transform|change|convert)\s+(.+?)\s+from\s+([a-z0-9]+)\s+(?:to|into)\s+([a-z0-9]+)",
            CommandAction::Convert,
            0.85,
            |caps, cmd| {
                cmd.source_path = Some(caps[1].trim_matches(['"', '\'']).to_string());
                cmd.source_format = Format::from_alias(&caps[2]);
                cmd.target_format = Format::from_alias(&caps[3]);
            },
        ),
        entry(
            "convert-path-to",
            r"^(?:convert|transform)\s+(\S+\.[a-z0-9]+)\s+(?:to|into)\s+([a-z0-9]+)",
            CommandAction::Convert,
            0.8,
            |caps, cmd| {
                cmd.source_path = Some(caps[1].to_string());
                cmd.target_format = Format::from_alias(&caps[2]);
            },
        ),
        entry(
            "format-to-format-path",
            r"^([a-z0-9]+)\s+(?:to|into)\s+([a-z0-9]+)\s+(\S+)",
            CommandAction::Convert,
            0.7,
            |caps, cmd| {
                cmd.source_format = Format::from_alias(&caps[1]);
                cmd.target_format = Format::from_alias(&caps[2]);
                cmd.source_path = Some(caps[3].to_string());
            },
        ),
        entry(
            "help",
            r"^(?:help|usage|commands)\b",
            CommandAction::Help,
            0.9,
            |_, _| {},
        ),
        entry(
            "export-save-as",
            r"^(?:export|save)\s+(\S+)\s+(?:as|to)\s+([a-z0-9]+)\b",
            CommandAction::Convert,
            0.75,
            |caps, cmd| {
                cmd.source_path = Some(caps[1].to_string());
                cmd.target_format = Format::from_alias(&caps[2]);
            },
        ),
    ]
});

const HELP_KEYWORDS: &[&str] = &["help", "usage", "how do i", "what can you do", "commands"];

/// Parses a free-text instruction. Never fails: unrecognized input yields an
/// `unknown` action at minimum confidence with generic suggestions.
pub fn parse_command(input: &str) -> ParsedCommand {
    let normalized = normalize(input);
    let mut best: Option<ParsedCommand> = None;
    for pattern in PATTERN_TABLE.iter() {
        let Some(caps) = pattern.regex.captures(&normalized) else {
            continue;
        };
        let mut candidate = ParsedCommand::new(pattern.action, pattern.base_confidence);
        (pattern.extract)(&caps, &mut candidate);
        extract_shared_options(&normalized, &mut candidate);
        adjust_confidence(&mut candidate);
        debug!(
            "pattern '{}' matched at confidence {:.2}",
            pattern.name, candidate.confidence
        );
        // Strict greater-than keeps the first table entry on ties.
        if best
            .as_ref()
            .is_none_or(|current| candidate.confidence > current.confidence)
        {
            best = Some(candidate);
        }
    }
    let mut command = best.unwrap_or_else(|| fallback_parse(&normalized));
    disambiguate(&mut command);
    command
}

fn normalize(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .split_whitespace()
        .join(" ")
}

static ENCODING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:encoding|charset)[\s:=]+([a-z0-9_-]+)").expect("encoding pattern")
});
static SHEET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bsheet\s+(?:"([^"]+)"|'([^']+)'|(\d+)\b|([a-z0-9_]+))"#).expect("sheet pattern")
});
static DELIMITER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:delimiter|separator|separated\s+by)[\s:=]*(?:"([^"]+)"|'([^']+)'|(\S+))"#)
        .expect("delimiter pattern")
});
static KEY_STYLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(camelcase|camel\s+case|snake_case|snake\s+case|lowercase|uppercase)\b")
        .expect("key style pattern")
});
static INCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:include|keep|only)\s+columns?\s+([a-z0-9_]+(?:(?:\s*,\s*|\s+and\s+)[a-z0-9_]+)*)")
        .expect("include pattern")
});
static EXCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:excluding|exclude|drop|without)\s+columns?\s+([a-z0-9_]+(?:(?:\s*,\s*|\s+and\s+)[a-z0-9_]+)*)",
    )
    .expect("exclude pattern")
});
static DATE_RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:between|from)\s+(\d{4}-\d{2}-\d{2})\s+(?:and|to|until)\s+(\d{4}-\d{2}-\d{2})")
        .expect("date range pattern")
});
static DATE_COLUMN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bdate\s+column\s+([a-z0-9_]+)").expect("date column pattern")
});
static PRESERVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:preserve|keep)\s+formatting\b").expect("preserve pattern")
});
static OVERWRITE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\boverwrite\b").expect("overwrite pattern"));
static BARE_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\w./\\-]+\.(?:csv|xlsx?|json|xml|md|markdown))\b").expect("bare path pattern")
});

/// Secondary extraction shared by every primary pattern and the fallback:
/// options are orthogonal to the command shape that matched.
fn extract_shared_options(text: &str, cmd: &mut ParsedCommand) {
    if let Some(caps) = ENCODING_PATTERN.captures(text) {
        let label = caps[1].to_string();
        if Encoding::for_label(label.as_bytes()).is_some() {
            cmd.options.encoding = Some(label);
        } else {
            cmd.ambiguities
                .push(format!("unrecognized encoding '{label}'"));
        }
    }
    if let Some(caps) = SHEET_PATTERN.captures(text) {
        if let Some(name) = caps.get(1).or(caps.get(2)) {
            cmd.options.sheet_name = Some(name.as_str().to_string());
        } else if let Some(index) = caps.get(3) {
            cmd.options.sheet_index = index.as_str().parse().ok();
        } else if let Some(word) = caps.get(4) {
            cmd.options.sheet_name = Some(word.as_str().to_string());
        }
    }
    if let Some(caps) = DELIMITER_PATTERN.captures(text) {
        let raw = caps
            .get(1)
            .or(caps.get(2))
            .or(caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        cmd.options.delimiter = Some(named_delimiter(raw));
    }
    if let Some(caps) = KEY_STYLE_PATTERN.captures(text) {
        cmd.options.key_style = caps[1].parse().ok();
    }
    if let Some(caps) = INCLUDE_PATTERN.captures(text) {
        cmd.options.include_columns = Some(split_column_list(&caps[1]));
    }
    if let Some(caps) = EXCLUDE_PATTERN.captures(text) {
        cmd.options.exclude_columns = Some(split_column_list(&caps[1]));
    }
    if let Some(caps) = DATE_RANGE_PATTERN.captures(text) {
        cmd.options.date_range = Some((caps[1].to_string(), caps[2].to_string()));
    }
    if let Some(caps) = DATE_COLUMN_PATTERN.captures(text) {
        cmd.options.date_column = Some(caps[1].to_string());
    }
    if OVERWRITE_PATTERN.is_match(text) {
        cmd.options.overwrite = true;
    }
    if PRESERVE_PATTERN.is_match(text) {
        cmd.options.preserve_formatting = true;
    }
}

fn named_delimiter(raw: &str) -> String {
    match raw {
        "tab" | "tabs" => "\t".to_string(),
        "comma" | "commas" => ",".to_string(),
        "semicolon" | "semicolons" => ";".to_string(),
        "pipe" | "pipes" => "|".to_string(),
        "space" | "spaces" => " ".to_string(),
        other => other.to_string(),
    }
}

fn split_column_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .flat_map(|part| part.split(" and "))
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty() && part != "and")
        .collect()
}

fn path_extension(path: &str) -> Option<&str> {
    let name = path.rsplit(['/', '\\']).next()?;
    let (_, extension) = name.rsplit_once('.')?;
    if extension.is_empty() { None } else { Some(extension) }
}

/// Confidence adjustment for convert candidates. The multipliers mirror how
/// much of the request is actually resolved; the floor keeps every result
/// actionable for re-prompting.
fn adjust_confidence(cmd: &mut ParsedCommand) {
    if cmd.action != CommandAction::Convert {
        cmd.confidence = cmd.confidence.max(0.1);
        return;
    }
    if cmd.source_format.is_none() {
        cmd.source_format = cmd
            .source_path
            .as_deref()
            .and_then(path_extension)
            .and_then(Format::from_extension);
    }
    let mut confidence = cmd.confidence;
    match &cmd.source_path {
        None => confidence *= 0.5,
        Some(path) => {
            if !path.contains('.') && !path.contains('/') && !path.contains('\\') {
                confidence *= 0.9;
            }
        }
    }
    if cmd.target_format.is_none() {
        confidence *= 0.6;
    }
    if cmd.source_format.is_none() {
        confidence *= 0.8;
    }
    if cmd.source_format.is_some() && cmd.target_format.is_some() {
        confidence = (confidence * 1.1).min(1.0);
    }
    cmd.confidence = confidence.max(0.1);
}

/// Last-resort interpretation when no primary pattern matches: a bare
/// `word.ext` path and/or known format keywords anywhere in the text.
fn fallback_parse(normalized: &str) -> ParsedCommand {
    if HELP_KEYWORDS
        .iter()
        .any(|keyword| normalized.contains(keyword))
    {
        let mut cmd = ParsedCommand::new(CommandAction::Help, 0.8);
        cmd.suggestions
            .push("try: convert <file> to <format>".to_string());
        return cmd;
    }

    let mut cmd = ParsedCommand::new(CommandAction::Unknown, 0.1);
    if let Some(caps) = BARE_PATH_PATTERN.captures(normalized) {
        cmd.action = CommandAction::Convert;
        cmd.source_path = Some(caps[1].to_string());
        cmd.confidence = 0.3;
    }

    let aliases: Vec<Format> = normalized
        .split_whitespace()
        .filter_map(Format::from_alias)
        .unique()
        .collect();
    if aliases.len() >= 2 {
        cmd.action = CommandAction::Convert;
        if cmd.source_format.is_none() {
            cmd.source_format = Some(aliases[0]);
        }
        cmd.target_format = Some(aliases[1]);
        cmd.confidence = cmd.confidence.max(0.4);
    } else if aliases.len() == 1 {
        cmd.target_format = Some(aliases[0]);
        cmd.confidence = cmd.confidence.max(0.25);
    }

    if cmd.action == CommandAction::Unknown {
        cmd.suggestions = vec![
            "try: convert <file> to <format>".to_string(),
            "type 'help' for usage examples".to_string(),
        ];
    } else if cmd.action == CommandAction::Convert && cmd.source_format.is_none() {
        cmd.source_format = cmd
            .source_path
            .as_deref()
            .and_then(path_extension)
            .and_then(Format::from_extension);
    }
    extract_shared_options(normalized, &mut cmd);
    cmd
}

/// Always-run final pass: records ambiguities and suggestions without ever
/// turning a low-confidence parse into an error.
fn disambiguate(cmd: &mut ParsedCommand) {
    if cmd.action == CommandAction::Convert {
        let inferable = cmd
            .source_path
            .as_deref()
            .and_then(path_extension)
            .and_then(Format::from_extension)
            .is_some();
        if cmd.source_format.is_none() && !inferable {
            cmd.ambiguities
                .push("source format could not be determined".to_string());
            cmd.suggestions
                .push("state the source format explicitly, e.g. 'from csv'".to_string());
        }
        if cmd.target_path.is_none() {
            cmd.suggestions
                .push("specify an output path to control where the result is written".to_string());
        }
    }
    if cmd.options.include_columns.is_some() && cmd.options.exclude_columns.is_some() {
        cmd.ambiguities.push(
            "both include and exclude column lists were given; they conflict".to_string(),
        );
    }
    if cmd.confidence < 0.7 {
        cmd.ambiguities.push(format!(
            "low-confidence interpretation ({:.2}); consider rephrasing",
            cmd.confidence
        ));
    }
}

/// Promotes a parsed convert command into a structured request. Key-casing
/// and filter options recognized by the parser are intentionally not carried
/// into `transformations`; callers attach those descriptors themselves.
pub fn to_conversion_request(parsed: &ParsedCommand) -> Result<ConversionRequest> {
    if parsed.action != CommandAction::Convert {
        return Err(TablecastError::InvalidCommand {
            message: "only convert commands can become conversion requests".to_string(),
            suggestions: vec!["phrase the instruction as 'convert <file> to <format>'".to_string()],
        });
    }
    let source_path = parsed
        .source_path
        .clone()
        .filter(|path| !path.is_empty())
        .ok_or_else(|| TablecastError::InvalidCommand {
            message: "no source path was recognized".to_string(),
            suggestions: vec!["name the file to convert, e.g. 'convert data.csv to json'".to_string()],
        })?;
    let target_format = parsed
        .target_format
        .ok_or_else(|| TablecastError::InvalidCommand {
            message: "no target format was recognized".to_string(),
            suggestions: vec![
                "name the output format, e.g. 'to json'".to_string(),
                "supported formats: csv, xlsx, json, xml, md".to_string(),
            ],
        })?;
    Ok(ConversionRequest {
        source_path,
        target_path: parsed.target_path.clone(),
        source_format: parsed.source_format,
        target_format,
        options: ConversionOptions {
            encoding: parsed.options.encoding.clone(),
            sheet_name: parsed.options.sheet_name.clone(),
            sheet_index: parsed.options.sheet_index,
            delimiter: parsed.options.delimiter.clone(),
            overwrite: parsed.options.overwrite,
            preserve_formatting: parsed.options.preserve_formatting,
        },
        transformations: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_with_explicit_formats_scores_high() {
        let cmd = parse_command("convert data.csv from csv to json");
        assert_eq!(cmd.action, CommandAction::Convert);
        assert_eq!(cmd.source_path.as_deref(), Some("data.csv"));
        assert_eq!(cmd.source_format, Some(Format::Csv));
        assert_eq!(cmd.target_format, Some(Format::Json));
        assert!(cmd.confidence >= 0.9);
    }

    #[test]
    fn convert_infers_source_format_from_extension() {
        let cmd = parse_command("convert data.csv to json");
        assert_eq!(cmd.action, CommandAction::Convert);
        assert_eq!(cmd.source_format, Some(Format::Csv));
        assert_eq!(cmd.target_format, Some(Format::Json));
        assert!(cmd.confidence >= 0.8);
    }

    #[test]
    fn as_clause_sets_the_target_path() {
        let cmd = parse_command("convert report.xlsx from excel to csv as out.csv");
        assert_eq!(cmd.target_path.as_deref(), Some("out.csv"));
        assert_eq!(cmd.source_format, Some(Format::Xlsx));
        assert_eq!(cmd.target_format, Some(Format::Csv));
    }

    #[test]
    fn format_to_format_path_shape_parses() {
        let cmd = parse_command("csv to json data.csv");
        assert_eq!(cmd.action, CommandAction::Convert);
        assert_eq!(cmd.source_format, Some(Format::Csv));
        assert_eq!(cmd.target_format, Some(Format::Json));
        assert_eq!(cmd.source_path.as_deref(), Some("data.csv"));
    }

    #[test]
    fn help_resolves_with_high_confidence() {
        let cmd = parse_command("help");
        assert_eq!(cmd.action, CommandAction::Help);
        assert!(cmd.confidence >= 0.8);
    }

    #[test]
    fn export_shape_parses_at_reduced_confidence() {
        let cmd = parse_command("export report.json as csv");
        assert_eq!(cmd.action, CommandAction::Convert);
        assert_eq!(cmd.source_path.as_deref(), Some("report.json"));
        assert_eq!(cmd.target_format, Some(Format::Csv));
    }

    #[test]
    fn secondary_pass_extracts_options() {
        let cmd = parse_command(
            "convert data.xlsx to csv with encoding utf-8 sheet \"Q1 Sales\" delimiter tab \
             camelCase keep columns name, age and email from 2024-01-01 to 2024-06-30 \
             date column joined overwrite",
        );
        assert_eq!(cmd.options.encoding.as_deref(), Some("utf-8"));
        assert_eq!(cmd.options.sheet_name.as_deref(), Some("q1 sales"));
        assert_eq!(cmd.options.delimiter.as_deref(), Some("\t"));
        assert_eq!(cmd.options.key_style, Some(KeyStyle::Camel));
        assert_eq!(
            cmd.options.include_columns.as_deref(),
            Some(&["name".to_string(), "age".to_string(), "email".to_string()][..])
        );
        assert_eq!(
            cmd.options.date_range,
            Some(("2024-01-01".to_string(), "2024-06-30".to_string()))
        );
        assert_eq!(cmd.options.date_column.as_deref(), Some("joined"));
        assert!(cmd.options.overwrite);
    }

    #[test]
    fn sheet_index_is_extracted_from_bare_numbers() {
        let cmd = parse_command("convert book.xlsx to csv sheet 2");
        assert_eq!(cmd.options.sheet_index, Some(2));
        assert_eq!(cmd.options.sheet_name, None);
    }

    #[test]
    fn fallback_infers_convert_from_two_format_words() {
        let cmd = parse_command("i would like excel turned into json please");
        assert_eq!(cmd.action, CommandAction::Convert);
        assert_eq!(cmd.source_format, Some(Format::Xlsx));
        assert_eq!(cmd.target_format, Some(Format::Json));
        assert!((cmd.confidence - 0.4).abs() < 0.2);
    }

    #[test]
    fn fallback_extracts_a_bare_path() {
        let cmd = parse_command("please deal with ./exports/data.csv somehow");
        assert_eq!(cmd.action, CommandAction::Convert);
        assert_eq!(cmd.source_path.as_deref(), Some("./exports/data.csv"));
        assert!(cmd.confidence <= 0.5);
    }

    #[test]
    fn unintelligible_input_is_unknown_with_suggestions() {
        let cmd = parse_command("the weather is nice today");
        assert_eq!(cmd.action, CommandAction::Unknown);
        assert!((cmd.confidence - 0.1).abs() < f64::EPSILON);
        assert!(!cmd.suggestions.is_empty());
    }

    #[test]
    fn disambiguation_flags_conflicting_column_lists() {
        let cmd = parse_command(
            "convert data.csv to json include columns a, b exclude columns c",
        );
        assert!(cmd
            .ambiguities
            .iter()
            .any(|a| a.contains("include and exclude")));
    }

    #[test]
    fn disambiguation_flags_undetermined_source_format() {
        let cmd = parse_command("export mydata to json");
        assert!(cmd
            .ambiguities
            .iter()
            .any(|a| a.contains("source format could not be determined")));
        assert!(cmd.confidence < 0.8);
    }

    #[test]
    fn low_confidence_parses_carry_an_advisory() {
        let cmd = parse_command("please deal with data.csv somehow");
        assert!(cmd
            .ambiguities
            .iter()
            .any(|a| a.contains("low-confidence")));
    }

    #[test]
    fn conversion_request_requires_convert_action() {
        let parsed = parse_command("help");
        assert!(matches!(
            to_conversion_request(&parsed),
            Err(TablecastError::InvalidCommand { .. })
        ));
    }

    #[test]
    fn conversion_request_carries_resolved_options() {
        let parsed = parse_command("convert data.xlsx to csv encoding latin1 sheet 3");
        let request = to_conversion_request(&parsed).unwrap();
        assert_eq!(request.source_path, "data.xlsx");
        assert_eq!(request.target_format, Format::Csv);
        assert_eq!(request.options.encoding.as_deref(), Some("latin1"));
        assert_eq!(request.options.sheet_index, Some(3));
        assert!(request.transformations.is_empty());
    }

    #[test]
    fn conversion_request_requires_a_target_format() {
        let parsed = parse_command("please deal with data.csv somehow");
        let err = to_conversion_request(&parsed).unwrap_err();
        let TablecastError::InvalidCommand { suggestions, .. } = err else {
            panic!("expected InvalidCommand");
        };
        assert!(!suggestions.is_empty());
    }

    #[test]
    fn normalization_handles_case_whitespace_and_curly_quotes() {
        let cmd = parse_command("  Convert   Data.CSV   to   JSON  ");
        assert_eq!(cmd.source_path.as_deref(), Some("data.csv"));
        assert_eq!(cmd.target_format, Some(Format::Json));

        let cmd = parse_command("convert book.xlsx to csv sheet \u{201C}summary\u{201D}");
        assert_eq!(cmd.options.sheet_name.as_deref(), Some("summary"));
    }
}
