//! Command-line interface definition.
//!
//! - `fob-preview build` - bundle a generation payload into a sandbox document
//! - `fob-preview check` - run the pre-flight gates without bundling

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// fob-preview - sandboxed previews of generated components
#[derive(Parser, Debug)]
#[command(
    name = "fob-preview",
    version,
    about = "Build sandboxed preview documents from generated files",
    long_about = "fob-preview bundles a set of generated source files into a single HTML\n\
                  document that renders the entry component. Imports are restricted to\n\
                  relative paths and the host-provided React modules."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle a generation payload into a sandbox document
    ///
    /// The payload is a JSON array of `{ "path", "content" }` records, or an
    /// object `{ "files": [...], "entryPath": "..." }`.
    Build(BuildArgs),

    /// Check size limits, import policy and entry shape without bundling
    Check(CheckArgs),
}

/// Options shared by every command that reads a payload.
#[derive(Args, Debug, Clone)]
pub struct PayloadArgs {
    /// Generation payload (JSON). Use `-` to read from stdin.
    #[arg(value_name = "PAYLOAD")]
    pub payload: PathBuf,

    /// Entry path inside the payload
    ///
    /// Overrides the payload's `entryPath` and the configured default.
    #[arg(short, long, value_name = "PATH")]
    pub entry: Option<String>,

    /// Path to a fob-preview.config.json file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum size of a single generated file, in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub payload: PayloadArgs,

    /// Write the sandbox document to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Also write the raw bundle to FILE
    #[arg(long, value_name = "FILE")]
    pub bundle_out: Option<PathBuf>,

    /// On failure, write the static error document before exiting
    #[arg(long)]
    pub error_document: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub payload: PayloadArgs,
}
