//! Error handling for the fob-preview CLI.
//!
//! `CliError` is what commands return. Preview build failures keep their
//! `fob_preview::Error` so they render with the library's diagnostic code
//! and help text.

use miette::Report;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A preview build or pre-flight check failed
    #[error(transparent)]
    Preview(#[from] fob_preview::Error),

    #[error("Invalid payload in {}: {source}\n\nHint: Expected a JSON array of {{ \"path\", \"content\" }} records or {{ \"files\": [...], \"entryPath\": \"...\" }}", .path.display())]
    InvalidPayload {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}\n\nHint: Create a fob-preview.config.json file or omit --config", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

impl CliError {
    /// Build failures that were caused by the generated input, as opposed
    /// to the command line or the filesystem.
    pub fn is_build_failure(&self) -> bool {
        matches!(self, Self::Preview(_))
    }
}

/// Convert a `CliError` into a miette report for display.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Preview(e) => Report::new(e),
        other => miette::miette!("{}", other),
    }
}
