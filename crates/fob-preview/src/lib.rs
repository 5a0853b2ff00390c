#![cfg_attr(docsrs, feature(doc_cfg))]

//! # fob-preview
//!
//! Turns a set of generated source files into a single sandboxed HTML
//! document that renders the entry component.
//!
//! A build runs four stages in order:
//!
//! 1. the [`VirtualFileTable`] is built from the generator's records and
//!    checked against the size limit,
//! 2. the import policy guard rejects any file importing a module that is
//!    neither relative nor host-provided,
//! 3. the entry is rewritten so its default export lands on a global slot,
//!    and the bundling engine runs with the virtual file and host shim hooks,
//! 4. the bundle is inlined into a [`SandboxDocument`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use fob_preview::{GeneratedFile, build_preview};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let files = vec![GeneratedFile::new(
//!     "app/generated/page.tsx",
//!     "export default function GeneratedPage() { return <h1>Hello</h1>; }",
//! )];
//!
//! let preview = build_preview(&files, "app/generated/page.tsx").await?;
//! std::fs::write("preview.html", preview.document.as_str())?;
//! # Ok(()) }
//! ```
//!
//! ## Custom engines
//!
//! The bundling engine sits behind [`BundleEngine`]. [`RolldownEngine`] is
//! the production implementation; tests and embedders can supply their own.
//!
//! ```no_run
//! use fob_preview::{PreviewBuilder, PreviewConfig, RolldownEngine, GeneratedFile};
//!
//! # async fn run(files: Vec<GeneratedFile>) -> fob_preview::Result<()> {
//! let builder = PreviewBuilder::new(PreviewConfig::default());
//! let preview = builder
//!     .build(&files, None, &RolldownEngine::new())
//!     .await?;
//! println!("{} bytes", preview.document.len());
//! # Ok(()) }
//! ```

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod entry;
pub mod files;
pub mod path;
pub mod pipeline;
pub mod plugins;
pub mod policy;
pub mod sandbox;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use config::PreviewConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSeverity};
pub use engine::{BundleEngine, BundleRequest, BundleResult, EngineOptions, RolldownEngine};
pub use entry::{DefaultExport, DefaultExportShape, rewrite_entry, rewrite_entry_source};
pub use files::{GeneratedFile, GenerationPayload, VirtualFile, VirtualFileTable};
pub use path::{normalize_path, resolve_relative};
pub use pipeline::{PreflightReport, PreviewBuild, PreviewBuilder, build_preview};
pub use plugins::{
    HostShimPlugin, LoadedModule, LoaderKind, Namespace, PluginSet, PreviewPlugin,
    ResolvedModule, VirtualFilePlugin,
};
pub use policy::{
    ALLOWED_BARE_SPECIFIERS, ImportKind, ImportSpecifier, PolicyViolation, check_import_policy,
    scan_import_specifiers,
};
pub use sandbox::{SandboxAssembler, SandboxDocument};

/// Error types for preview builds.
///
/// Every variant is fatal to the build that produced it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more files import modules outside the allow-list.
    #[error("Import policy violation: {}", format_violations(.0))]
    PolicyViolation(Vec<PolicyViolation>),

    /// A relative import matched no file in the build.
    #[error("Could not resolve \"{specifier}\" imported from \"{importer}\"")]
    UnresolvedImport { specifier: String, importer: String },

    /// The entry path is not in the file set.
    #[error("Entry file not found: {0}")]
    EntryNotFound(String),

    /// The entry has no recognised default-export shape.
    #[error(
        "{path}: entry must export a named default component \
         (`export default function Name() {{}}` or `export default Name;`)"
    )]
    MissingDefaultExport { path: String },

    /// The bundling engine failed.
    #[error("Bundler error: {}", format_bundler_error(.0))]
    Bundler(Vec<Diagnostic>),

    /// The bundling engine succeeded but produced no code.
    #[error("Bundler produced no output for {0}")]
    EmptyOutput(String),

    /// A generated file exceeds the size limit.
    #[error("File too large: {path} ({size} bytes exceeds limit of {max_size} bytes)")]
    FileTooLarge {
        path: String,
        size: usize,
        max_size: usize,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for preview operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from an engine error value.
    ///
    /// Extracts structured diagnostics from the error's debug output.
    pub fn from_engine_error(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundler(diagnostics::extract_from_engine_error(error))
    }

    /// Short category name, used in logs.
    pub fn category(&self) -> &'static str {
        match self {
            Error::PolicyViolation(_) => "policy",
            Error::UnresolvedImport { .. }
            | Error::EntryNotFound(_)
            | Error::MissingDefaultExport { .. }
            | Error::Bundler(_)
            | Error::EmptyOutput(_) => "resolution",
            Error::FileTooLarge { .. } => "limits",
            Error::InvalidConfig(_) => "config",
        }
    }
}

fn format_violations(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Format bundler error diagnostics for display.
fn format_bundler_error(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "Unknown bundler error".to_string(),
        [diag] => format!("{}: {}", diag.kind, diag.message),
        _ => format!(
            "{} errors: {}",
            diagnostics.len(),
            diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.kind, d.message))
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::PolicyViolation(_) => "POLICY_VIOLATION",
            Error::UnresolvedImport { .. } => "UNRESOLVED_IMPORT",
            Error::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Error::MissingDefaultExport { .. } => "MISSING_DEFAULT_EXPORT",
            Error::Bundler(_) => "BUNDLER_ERROR",
            Error::EmptyOutput(_) => "EMPTY_OUTPUT",
            Error::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::PolicyViolation(_) => Some(Box::new(format!(
                "Generated code may only import other generated files (./ or ../) and: {}",
                ALLOWED_BARE_SPECIFIERS.join(", ")
            ))),
            Error::UnresolvedImport { importer, .. } => Some(Box::new(format!(
                "No generated file matches this import from '{}'.\nTried the exact path, then .tsx, .ts, .jsx and .js, then index files.",
                importer
            ))),
            Error::EntryNotFound(path) => Some(Box::new(format!(
                "Include a file at '{}' or pass a different entry path.",
                path
            ))),
            Error::MissingDefaultExport { .. } => Some(Box::new(
                "Declare the component as `export default function Page() { ... }`, or declare it first and add `export default Page;`.",
            )),
            Error::Bundler(diagnostics) => {
                if diagnostics.len() == 1 {
                    diagnostics[0]
                        .help
                        .as_ref()
                        .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>)
                } else {
                    Some(Box::new(
                        "Multiple bundler errors occurred. See details above.".to_string(),
                    ))
                }
            }
            Error::FileTooLarge { path, max_size, .. } => Some(Box::new(format!(
                "Split '{}' into smaller modules, or raise maxFileSize above {} bytes.",
                path, max_size
            ))),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check your configuration file for invalid values.\nError: {}",
                msg
            ))),
            Error::EmptyOutput(_) => None,
        }
    }
}
