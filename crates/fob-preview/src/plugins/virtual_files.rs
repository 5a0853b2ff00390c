//! Virtual file plugin for serving generated files to the bundling engine.
//!
//! Relative specifiers are resolved against the importer with
//! [`resolve_relative`] and then matched against the table through a fixed
//! list of candidates. The entry path itself (requested with no importer) is
//! mapped into the same namespace. Anything else is left to other hooks.

use std::sync::Arc;

use super::{LoadedModule, LoaderKind, Namespace, ResolveOutcome, ResolvedModule};
use crate::files::VirtualFileTable;
use crate::path::{extension, normalize_path, resolve_relative};
use crate::policy::is_relative;
use crate::Error;

/// Extensions tried, in order, for extensionless relative imports.
pub const SOURCE_EXTENSIONS: &[&str] = &[".tsx", ".ts", ".jsx", ".js"];

/// Plugin that serves the per-build [`VirtualFileTable`].
#[derive(Debug, Clone)]
pub struct VirtualFilePlugin {
    files: Arc<VirtualFileTable>,
    entry: String,
}

impl VirtualFilePlugin {
    pub fn new(files: Arc<VirtualFileTable>, entry: impl Into<String>) -> Self {
        Self {
            files,
            entry: normalize_path(&entry.into()),
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Resolve a specifier.
    ///
    /// - Relative specifiers must match a candidate; a miss is an
    ///   [`Error::UnresolvedImport`].
    /// - With no importer, a specifier naming a table file (the entry) is
    ///   claimed.
    /// - Everything else returns `Ok(None)`.
    pub fn resolve(&self, importer: Option<&ResolvedModule>, specifier: &str) -> ResolveOutcome {
        if is_relative(specifier) {
            let importer_path = importer
                .filter(|m| m.namespace == Namespace::VirtualFile)
                .map(|m| m.path.as_str())
                .unwrap_or("");
            let base = resolve_relative(importer_path, specifier);

            return match self.first_match(&base) {
                Some(path) => Ok(Some(ResolvedModule::virtual_file(path))),
                None => Err(Error::UnresolvedImport {
                    specifier: specifier.to_string(),
                    importer: importer
                        .map(|m| m.path.clone())
                        .unwrap_or_else(|| "<entry>".to_string()),
                }),
            };
        }

        if importer.is_none() {
            let normalized = normalize_path(specifier);
            if self.files.contains(&normalized) {
                return Ok(Some(ResolvedModule::virtual_file(normalized)));
            }
        }

        Ok(None)
    }

    /// Serve a virtual module's content with its extension-derived loader.
    pub fn load(&self, module: &ResolvedModule) -> Option<LoadedModule> {
        if module.namespace != Namespace::VirtualFile {
            return None;
        }
        let contents = self.files.get(&module.path)?;
        Some(LoadedModule {
            contents: contents.to_string(),
            loader: infer_loader(&module.path),
        })
    }

    fn first_match(&self, base: &str) -> Option<String> {
        resolution_candidates(base)
            .into_iter()
            .find(|candidate| self.files.contains(candidate))
    }
}

/// Candidate paths for a resolved relative base, in priority order.
///
/// Exact path, then each source extension appended, then `index` plus each
/// extension inside the directory.
pub fn resolution_candidates(base: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(1 + SOURCE_EXTENSIONS.len() * 2);
    if !base.is_empty() {
        candidates.push(base.to_string());
        for ext in SOURCE_EXTENSIONS {
            candidates.push(format!("{}{}", base, ext));
        }
    }
    for ext in SOURCE_EXTENSIONS {
        if base.is_empty() {
            candidates.push(format!("index{}", ext));
        } else {
            candidates.push(format!("{}/index{}", base, ext));
        }
    }
    candidates
}

/// Loader kind from the file extension.
///
/// Unknown extensions get [`LoaderKind::Tsx`], which parses the widest range
/// of syntax.
pub fn infer_loader(path: &str) -> LoaderKind {
    match extension(path) {
        Some("tsx") => LoaderKind::Tsx,
        Some("ts") | Some("mts") | Some("cts") => LoaderKind::Ts,
        Some("jsx") => LoaderKind::Jsx,
        Some("js") | Some("mjs") | Some("cjs") => LoaderKind::Js,
        Some("css") => LoaderKind::Css,
        _ => LoaderKind::Tsx,
    }
}
