//! Resolver and loader hooks handed to the bundling engine.
//!
//! There are exactly two hook sets:
//! - [`HostShimPlugin`] intercepts the allow-listed framework imports and
//!   serves synthetic modules that read host globals.
//! - [`VirtualFilePlugin`] serves generated files out of the per-build
//!   [`VirtualFileTable`](crate::VirtualFileTable).
//!
//! Both are wrapped in the closed [`PreviewPlugin`] enum and registered in a
//! [`PluginSet`], which the engine consults for every `resolve` and `load`.
//! Module ids are namespaced strings (`fob-virtual:app/page.tsx`,
//! `fob-shim:react`) so that a loader can tell which table to read from.

pub mod host_shims;
pub mod registry;
pub mod virtual_files;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use host_shims::{HOST_SHIMS, HostShim, HostShimPlugin};
pub use registry::{PluginPhase, PluginSet, PreviewPlugin};
pub use virtual_files::{SOURCE_EXTENSIONS, VirtualFilePlugin, infer_loader, resolution_candidates};

/// Which hook set owns a resolved module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    VirtualFile,
    HostShim,
}

impl Namespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::VirtualFile => "fob-virtual",
            Namespace::HostShim => "fob-shim",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "fob-virtual" => Some(Namespace::VirtualFile),
            "fob-shim" => Some(Namespace::HostShim),
            _ => None,
        }
    }
}

/// A module id produced by one of the resolvers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedModule {
    pub namespace: Namespace,
    /// Normalized virtual path, or the shim's specifier.
    pub path: String,
}

impl ResolvedModule {
    pub fn virtual_file(path: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::VirtualFile,
            path: path.into(),
        }
    }

    pub fn host_shim(specifier: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::HostShim,
            path: specifier.into(),
        }
    }

    /// Engine-facing id, e.g. `fob-virtual:app/generated/page.tsx`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.namespace.prefix(), self.path)
    }

    /// Parse an id produced by [`ResolvedModule::id`].
    ///
    /// Returns `None` for ids that belong to the engine itself.
    pub fn parse_id(id: &str) -> Option<Self> {
        let (prefix, path) = id.split_once(':')?;
        Some(Self {
            namespace: Namespace::from_prefix(prefix)?,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for ResolvedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// How the engine should parse a loaded module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    Js,
    Jsx,
    Ts,
    Tsx,
    Css,
}

impl LoaderKind {
    pub fn is_stylesheet(self) -> bool {
        matches!(self, LoaderKind::Css)
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoaderKind::Js => "js",
            LoaderKind::Jsx => "jsx",
            LoaderKind::Ts => "ts",
            LoaderKind::Tsx => "tsx",
            LoaderKind::Css => "css",
        };
        f.write_str(name)
    }
}

/// Contents returned by a loader hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub contents: String,
    pub loader: LoaderKind,
}

/// `Ok(None)` means "not mine, ask the next hook set".
pub type ResolveOutcome = crate::Result<Option<ResolvedModule>>;
