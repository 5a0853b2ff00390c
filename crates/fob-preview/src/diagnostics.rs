//! Diagnostic extraction from bundling engine errors.
//!
//! Engines report failures as opaque error values. This module turns their
//! debug output into [`Diagnostic`] records that are cloneable, serializable
//! and independent of the engine's own types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::plugins::ResolvedModule;

/// One engine-reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: DiagnosticSeverity,
    pub message: String,
    /// Virtual path of the file involved, if one could be found.
    pub file: Option<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            file: None,
            help: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Diagnostic kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    UnresolvedImport,
    UnresolvedEntry,
    MissingExport,
    Plugin,
    Transform,
    Other,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::ParseError => "ParseError",
            DiagnosticKind::UnresolvedImport => "UnresolvedImport",
            DiagnosticKind::UnresolvedEntry => "UnresolvedEntry",
            DiagnosticKind::MissingExport => "MissingExport",
            DiagnosticKind::Plugin => "Plugin",
            DiagnosticKind::Transform => "Transform",
            DiagnosticKind::Other => "Error",
        };
        f.write_str(name)
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// Longest message kept when no message field can be found.
const MAX_MESSAGE_CHARS: usize = 400;

/// Debug fields that carry module source text. Their values never reach a
/// diagnostic: the entry source includes the injected global-slot line.
const ELIDED_FIELDS: &[&str] = &["source", "source_text"];

const MESSAGE_FIELDS: &[&str] = &["error_message", "message", "reason"];
const FILE_FIELDS: &[&str] = &["filename", "id", "importer"];
const HELP_FIELDS: &[&str] = &["error_help", "help"];

/// Extract diagnostics from an engine error.
///
/// Batched errors (several diagnostics in one value) are split per
/// diagnostic; everything else yields exactly one. The full debug dump is
/// only logged at debug level.
pub fn extract_from_engine_error(error: &dyn fmt::Debug) -> Vec<Diagnostic> {
    let raw = format!("{error:?}");
    tracing::debug!(error = %raw, "Engine error");

    let text = ELIDED_FIELDS
        .iter()
        .fold(raw, |text, field| elide_quoted_field(&text, field));
    let text = text.replace("BatchedBuildDiagnostic", "");

    let parts: Vec<&str> = text
        .split("BuildDiagnostic")
        .filter(|part| part.chars().any(char::is_alphanumeric))
        .collect();

    if parts.is_empty() {
        vec![extract_single(&text)]
    } else {
        parts.into_iter().map(extract_single).collect()
    }
}

fn extract_single(text: &str) -> Diagnostic {
    let kind = classify(text);
    let severity = if text.contains("Warning") || text.contains("warning:") {
        DiagnosticSeverity::Warning
    } else {
        DiagnosticSeverity::Error
    };

    let message = MESSAGE_FIELDS
        .iter()
        .find_map(|field| quoted_field(text, field))
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| compact(text));

    let file = FILE_FIELDS
        .iter()
        .find_map(|field| quoted_field(text, field))
        .map(|id| ResolvedModule::parse_id(&id).map_or(id, |module| module.path))
        .or_else(|| extract_file_path(text));

    let help = HELP_FIELDS
        .iter()
        .find_map(|field| quoted_field(text, field))
        .or_else(|| extract_help_text(text))
        .or_else(|| default_help(&kind));

    Diagnostic {
        kind,
        severity,
        message,
        file,
        help,
    }
}

/// Whitespace-collapsed `text` without the surrounding debug punctuation,
/// cut at [`MAX_MESSAGE_CHARS`].
fn compact(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = joined.trim_matches(|c: char| matches!(c, ' ' | ',' | '{' | '}' | '(' | ')' | '[' | ']'));
    match trimmed.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Byte index of the opening quote of `name: "..."`, searching from `from`.
/// `name` must be a whole field name, so `message` does not match
/// `error_message`.
fn find_field(text: &str, name: &str, from: usize) -> Option<usize> {
    let needle = format!("{name}: \"");
    let mut search = from;
    while let Some(found) = text[search..].find(&needle) {
        let at = search + found;
        let whole_name = text[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        if whole_name {
            return Some(at + needle.len() - 1);
        }
        search = at + needle.len();
    }
    None
}

/// Decode the debug-escaped string starting at the quote at `quote`.
///
/// Returns the contents and the byte index just past the closing quote.
fn read_quoted(text: &str, quote: usize) -> Option<(String, usize)> {
    let body = quote + 1;
    let mut out = String::new();
    let mut chars = text[body..].char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => return Some((out, body + i + 1)),
            '\\' => match chars.next()?.1 {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                'u' => {
                    let hex: String = chars
                        .by_ref()
                        .map(|(_, c)| c)
                        .take_while(|&c| c != '}')
                        .filter(|&c| c != '{')
                        .collect();
                    if let Some(decoded) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        out.push(decoded);
                    }
                }
                other => out.push(other),
            },
            _ => out.push(ch),
        }
    }
    None
}

fn quoted_field(text: &str, name: &str) -> Option<String> {
    let quote = find_field(text, name, 0)?;
    read_quoted(text, quote).map(|(value, _)| value)
}

/// Replace every `name: "..."` value in `text` with `..`.
fn elide_quoted_field(text: &str, name: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = 0;
    while let Some(quote) = find_field(text, name, rest) {
        let Some((_, end)) = read_quoted(text, quote) else {
            break;
        };
        out.push_str(&text[rest..quote]);
        out.push_str("..");
        rest = end;
    }
    out.push_str(&text[rest..]);
    out
}

fn classify(text: &str) -> DiagnosticKind {
    if text.contains("Could not resolve") || text.contains("UnresolvedImport") {
        DiagnosticKind::UnresolvedImport
    } else if text.contains("UnresolvedEntry") {
        DiagnosticKind::UnresolvedEntry
    } else if text.contains("MissingExport") {
        DiagnosticKind::MissingExport
    } else if text.contains("ParseError")
        || text.contains("Parse error")
        || text.contains("Syntax")
        || text.contains("Unexpected token")
        || text.contains("Expected")
    {
        DiagnosticKind::ParseError
    } else if text.contains("Plugin") || text.contains("fob-preview") {
        DiagnosticKind::Plugin
    } else if text.contains("Transform") || text.contains("transform") {
        DiagnosticKind::Transform
    } else {
        DiagnosticKind::Other
    }
}

fn default_help(kind: &DiagnosticKind) -> Option<String> {
    match kind {
        DiagnosticKind::ParseError => Some(
            "The generated file is not valid for its extension. Check the file's syntax."
                .to_string(),
        ),
        DiagnosticKind::MissingExport => Some(
            "An import names an export the target file does not declare.".to_string(),
        ),
        _ => None,
    }
}

/// Find the first module id or source path mentioned in `text`.
///
/// Namespaced ids are reported as their virtual path.
fn extract_file_path(text: &str) -> Option<String> {
    let is_delimiter = |c: char| c.is_whitespace() || matches!(c, '"' | '\'' | ',' | '(' | ')' | '`');

    for token in text.split(is_delimiter) {
        let token = token.trim_end_matches([':', '.']);
        if let Some(module) = ResolvedModule::parse_id(token) {
            return Some(module.path);
        }
    }

    for ext in [".tsx", ".ts", ".jsx", ".js", ".css"] {
        if let Some(token) = text
            .split(is_delimiter)
            .map(|t| t.trim_end_matches(':'))
            .find(|t| t.len() > ext.len() && t.ends_with(ext))
        {
            return Some(token.to_string());
        }
    }
    None
}

/// Extract help text from error message.
fn extract_help_text(text: &str) -> Option<String> {
    ["help: ", "Help: ", "hint: ", "Hint: "]
        .iter()
        .find_map(|indicator| {
            let pos = text.find(indicator)?;
            let help = text[pos + indicator.len()..].lines().next()?.trim();
            (!help.is_empty()).then(|| help.to_string())
        })
}
