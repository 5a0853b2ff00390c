//! The bundling engine seam.
//!
//! The pipeline hands an engine a [`BundleRequest`] and awaits one
//! [`BundleResult`]. The engine owns parsing, transforms and tree assembly;
//! module lookup goes through the request's [`PluginSet`] only.

mod rolldown_engine;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::plugins::PluginSet;

pub use rolldown_engine::{PreviewRolldownPlugin, RolldownEngine, module_type_for};

/// Statement placed before the bundle so classic-runtime JSX and shim
/// modules find the host runtime.
pub const REACT_BANNER: &str = "var React = globalThis.React;";

/// Syntax target the preview bundle is produced for.
pub const BASELINE_TARGET: &str = "esnext";

/// A bundling engine.
#[async_trait]
pub trait BundleEngine: Send + Sync {
    /// Engine name, used in logs.
    fn name(&self) -> &'static str;

    /// Bundle `request.entry` into a single script.
    async fn bundle(&self, request: BundleRequest) -> Result<BundleResult>;
}

/// Everything an engine needs for one build.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    /// Normalized entry path, present in the virtual file table.
    pub entry: String,
    pub plugins: Arc<PluginSet>,
    pub options: EngineOptions,
}

/// Engine settings.
///
/// Output is always a single browser IIFE; these are the knobs left over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Follow imports into one output. Disabling it is not supported by
    /// [`RolldownEngine`].
    pub bundle: bool,
    pub sourcemap: bool,
    pub minify: bool,
    pub target: String,
    /// Prepended verbatim to the output code.
    pub banner: String,
}

impl EngineOptions {
    /// The fixed preview configuration.
    pub fn preview() -> Self {
        Self {
            bundle: true,
            sourcemap: false,
            minify: false,
            target: BASELINE_TARGET.to_string(),
            banner: REACT_BANNER.to_string(),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::preview()
    }
}

/// Output of one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleResult {
    /// Browser-executable script, banner included.
    pub code: String,
    /// Stylesheets the engine emitted alongside the script.
    pub stylesheets: Vec<String>,
}

impl BundleResult {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            stylesheets: Vec::new(),
        }
    }

    /// `true` when there is no code besides whitespace.
    pub fn is_empty(&self) -> bool {
        self.code.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }
}

/// Prepend `banner` to `code` on its own line.
pub(crate) fn with_banner(banner: &str, code: &str) -> String {
    if banner.is_empty() {
        return code.to_string();
    }
    let mut out = String::with_capacity(banner.len() + 1 + code.len());
    out.push_str(banner);
    out.push('\n');
    out.push_str(code);
    out
}
