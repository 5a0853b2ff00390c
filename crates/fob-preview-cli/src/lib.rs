//! Command-line interface for `fob-preview`.
//!
//! - [`cli`] - clap argument definitions
//! - [`commands`] - `build` and `check`
//! - [`config`] - layered configuration loading
//! - [`error`] - CLI error types and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - terminal status output

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result};
